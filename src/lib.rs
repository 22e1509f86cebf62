//! CARTA Scripting Client
//!
//! Drive a running CARTA frontend session from Rust:
//! - Generic action dispatch over the backend's gRPC interface
//! - Macros for values the frontend resolves at call time
//! - Validated session and image operations
//! - Enumerated frontend constants (colormaps, overlay components, ...)

pub mod config;
pub mod constants;
pub mod error;
pub mod image;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::ClientConfig;
pub use constants::{
    BeamType, Colormap, ConstantSet, ContourDashMode, CoordinateSystem, LabelType, Overlay, PaletteColor, Scaling,
    SmoothingMode,
};
pub use error::{CartaError, CartaResult};
pub use image::Image;
pub use protocol::{Arg, CallOptions, Macro};
pub use session::{Browser, Session};
pub use transport::{ActionTransport, GrpcTransport, TransportError};
