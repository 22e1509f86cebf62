//! Utils Module
pub mod truncate;

pub use truncate::truncate_text;
