//! RGB colors and the default plot palette.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

/// A 24-bit RGB color used for plot lines and tree labels.
///
/// Colors are written and parsed as `#RRGGBB` (case-insensitive on input).
///
/// ```
/// use hwscope_types::Rgb;
///
/// let c: Rgb = "#ff4500".parse().unwrap();
/// assert_eq!(c, Rgb::new(255, 69, 0));
/// assert_eq!(c.to_string(), "#FF4500");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Create a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 128, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const ORANGE_RED: Rgb = Rgb::new(255, 69, 0);
    pub const LIGHT_SEA_GREEN: Rgb = Rgb::new(32, 178, 170);
    pub const GOLDENROD: Rgb = Rgb::new(218, 165, 32);
    pub const DARK_VIOLET: Rgb = Rgb::new(148, 0, 211);
    pub const YELLOW_GREEN: Rgb = Rgb::new(154, 205, 50);
    pub const SADDLE_BROWN: Rgb = Rgb::new(139, 69, 19);
    pub const ROYAL_BLUE: Rgb = Rgb::new(65, 105, 225);
    pub const DEEP_PINK: Rgb = Rgb::new(255, 20, 147);
    pub const MEDIUM_SEA_GREEN: Rgb = Rgb::new(60, 179, 113);
    pub const OLIVE: Rgb = Rgb::new(128, 128, 0);
    pub const FIREBRICK: Rgb = Rgb::new(178, 34, 34);
}

/// Default palette for plotted sensors, in assignment order.
pub const DEFAULT_PALETTE: [Rgb; 13] = [
    Rgb::BLUE,
    Rgb::ORANGE_RED,
    Rgb::GREEN,
    Rgb::LIGHT_SEA_GREEN,
    Rgb::GOLDENROD,
    Rgb::DARK_VIOLET,
    Rgb::YELLOW_GREEN,
    Rgb::SADDLE_BROWN,
    Rgb::ROYAL_BLUE,
    Rgb::DEEP_PINK,
    Rgb::MEDIUM_SEA_GREEN,
    Rgb::OLIVE,
    Rgb::FIREBRICK,
];

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidColor(s.to_string());

        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

#[cfg(feature = "serde")]
impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lowercase_and_uppercase() {
        assert_eq!("#00ff7f".parse::<Rgb>().unwrap(), Rgb::new(0, 255, 127));
        assert_eq!("#00FF7F".parse::<Rgb>().unwrap(), Rgb::new(0, 255, 127));
        assert_eq!(" #010203 ".parse::<Rgb>().unwrap(), Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "#", "00FF7F", "#00FF7", "#00FF7FF", "#GG0000", "#+1+2+3"] {
            let err = bad.parse::<Rgb>().unwrap_err();
            assert!(matches!(err, ParseError::InvalidColor(_)), "{bad}");
        }
    }

    #[test]
    fn test_display_is_uppercase_hex() {
        assert_eq!(Rgb::DEEP_PINK.to_string(), "#FF1493");
    }

    #[test]
    fn test_default_palette_is_distinct() {
        for (i, a) in DEFAULT_PALETTE.iter().enumerate() {
            for b in &DEFAULT_PALETTE[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Rgb::OLIVE).unwrap();
        assert_eq!(json, "\"#808000\"");
        let back: Rgb = serde_json::from_str("\"#808000\"").unwrap();
        assert_eq!(back, Rgb::OLIVE);
        assert!(serde_json::from_str::<Rgb>("\"olive\"").is_err());
    }
}
