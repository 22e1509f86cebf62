//! Frontend Constants
//!
//! Enumerated values defined by the frontend. Use these instead of literal
//! strings and numbers: `Colormap::Viridis` rather than `"viridis"`. Each
//! vocabulary is a closed enum, and its members back the
//! [`crate::validation::Constant`] descriptor.

use serde_json::Value;

use crate::protocol::Arg;

/// A closed vocabulary of frontend values.
pub trait ConstantSet: Copy + Send + Sync + 'static {
    /// Name used in parameter descriptions.
    const NAME: &'static str;

    /// Every member, in declaration order.
    fn members() -> &'static [Self];

    /// The value sent to the frontend for this member.
    fn value(&self) -> Value;
}

macro_rules! constant_set {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl ConstantSet for $name {
            const NAME: &'static str = stringify!($name);

            fn members() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn value(&self) -> Value {
                match self {
                    $($name::$variant => Value::from($value)),+
                }
            }
        }

        impl From<$name> for Value {
            fn from(c: $name) -> Value {
                c.value()
            }
        }

        impl From<$name> for Arg {
            fn from(c: $name) -> Arg {
                Arg::Literal(c.value())
            }
        }
    };
}

constant_set! {
    /// All available colormaps.
    Colormap {
        Accent => "accent",
        Afmhot => "afmhot",
        Autumn => "autumn",
        Binary => "binary",
        Blues => "Blues",
        Bone => "bone",
        BrBG => "BrBG",
        Brg => "brg",
        BuGn => "BuGn",
        BuPu => "BuPu",
        Bwr => "bwr",
        Cmrmap => "CMRmap",
        Cool => "cool",
        Coolwarm => "coolwarm",
        Copper => "copper",
        Cubehelix => "cubehelix",
        Dark2 => "dark2",
        Flag => "flag",
        GistEarth => "gist_earth",
        GistGray => "gist_gray",
        GistHeat => "gist_heat",
        GistNcar => "gist_ncar",
        GistRainbow => "gist_rainbow",
        GistStern => "gist_stern",
        GistYarg => "gist_yarg",
        GnBu => "GnBu",
        Gnuplot => "gnuplot",
        Gnuplot2 => "gnuplot2",
        Gray => "gray",
        Greens => "greens",
        Greys => "greys",
        Hot => "hot",
        Hsv => "hsv",
        Inferno => "inferno",
        Jet => "jet",
        Magma => "magma",
        NipySpectral => "nipy_spectral",
        Ocean => "ocean",
        Oranges => "oranges",
        OrRd => "OrRd",
        Paired => "paired",
        Pastel1 => "pastel1",
        Pastel2 => "pastel2",
        Pink => "pink",
        PiYG => "PiYG",
        Plasma => "plasma",
        PRGn => "PRGn",
        Prism => "prism",
        PuBu => "PuBu",
        PuBuGn => "PuBuGn",
        PuOr => "PuOr",
        PuRd => "PuRd",
        Purples => "purples",
        Rainbow => "rainbow",
        RdBu => "RdBu",
        RdGy => "RdGy",
        RdPu => "RdPu",
        RdYlBu => "RdYlBu",
        RdYlGn => "RdYlGn",
        Reds => "reds",
        Seismic => "seismic",
        Set1 => "set1",
        Set2 => "set2",
        Set3 => "set3",
        Spectral => "spectral",
        Spring => "spring",
        Summer => "summer",
        Tab10 => "tab10",
        Tab20 => "tab20",
        Tab20b => "tab20b",
        Tab20c => "tab20c",
        Terrain => "terrain",
        Viridis => "viridis",
        Winter => "winter",
        Wistia => "Wistia",
        YlGn => "YlGn",
        YlGnBu => "YlGnBu",
        YlOrBr => "YlOrBr",
        YlOrRd => "YlOrRd",
    }
}

constant_set! {
    /// Colormap scaling types.
    Scaling {
        Linear => 0,
        Log => 1,
        Sqrt => 2,
        Square => 3,
        Power => 4,
        Gamma => 5,
    }
}

constant_set! {
    /// Coordinate systems.
    CoordinateSystem {
        Auto => "Auto",
        Ecliptic => "Ecliptic",
        Fk4 => "FK4",
        Fk5 => "FK5",
        Galactic => "Galactic",
        Icrs => "ICRS",
    }
}

constant_set! {
    /// Label types.
    LabelType {
        Internal => "Internal",
        External => "External",
    }
}

constant_set! {
    /// Beam types.
    BeamType {
        Open => "Open",
        Solid => "Solid",
    }
}

constant_set! {
    /// Palette colours used for overlay elements.
    PaletteColor {
        Black => 0,
        White => 1,
        Red => 2,
        Green => 3,
        Blue => 4,
        Turquoise => 5,
        Violet => 6,
        Gold => 7,
        Gray => 8,
    }
}

constant_set! {
    /// Overlay elements.
    ///
    /// The values are paths to the stores for these elements, relative to the
    /// overlay store. The beam has an extra level of indirection.
    Overlay {
        Global => "global",
        Title => "title",
        Grid => "grid",
        Border => "border",
        Ticks => "ticks",
        Axes => "axes",
        Numbers => "numbers",
        Labels => "labels",
        Beam => "beam.settingsForDisplay",
    }
}

constant_set! {
    /// Contour smoothing modes.
    SmoothingMode {
        NoSmoothing => 0,
        BlockAverage => 1,
        GaussianBlur => 2,
    }
}

constant_set! {
    /// Contour dash modes.
    ContourDashMode {
        None => "None",
        Dashed => "Dashed",
        NegativeOnly => "NegativeOnly",
    }
}

impl Overlay {
    /// Store path relative to `overlayStore`.
    pub fn store(&self) -> String {
        match self.value() {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_colormap_vocabulary() {
        assert_eq!(Colormap::members().len(), 79);
        assert_eq!(Colormap::Viridis.value(), Value::from("viridis"));
        assert_eq!(Colormap::GistHeat.value(), Value::from("gist_heat"));
        assert_eq!(Colormap::Cmrmap.value(), Value::from("CMRmap"));

        let distinct: HashSet<String> = Colormap::members().iter().map(|c| c.value().to_string()).collect();
        assert_eq!(distinct.len(), 79);
    }

    #[test]
    fn test_numeric_vocabularies() {
        assert_eq!(Value::from(Scaling::Gamma), Value::from(5));
        assert_eq!(Value::from(PaletteColor::Gray), Value::from(8));
        assert_eq!(SmoothingMode::members().len(), 3);
    }

    #[test]
    fn test_overlay_store_paths() {
        assert_eq!(Overlay::Beam.store(), "beam.settingsForDisplay");
        assert_eq!(Overlay::Title.store(), "title");
        assert_eq!(Overlay::NAME, "Overlay");
    }
}
