//! 24-bit RGB colors and hex parsing.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AlienFxError, Result};

/// An RGB triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RGB`, `#RRGGBB`, `RGB` or `RRGGBB`.
    ///
    /// Short form expands each digit (`#F80` is `#FF8800`).
    ///
    /// # Example
    /// ```
    /// use alienfx_rust::model::Rgb;
    ///
    /// assert_eq!(Rgb::from_hex("#FF5500").unwrap(), Rgb::new(255, 85, 0));
    /// assert_eq!(Rgb::from_hex("f80").unwrap(), Rgb::new(255, 136, 0));
    /// assert!(Rgb::from_hex("#12345").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
        let invalid = || AlienFxError::InvalidColor(hex.to_string());

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        match digits.len() {
            3 => {
                let nibble = |i: usize| {
                    u8::from_str_radix(&digits[i..=i], 16)
                        .map(|v| v * 0x11)
                        .map_err(|_| invalid())
                };
                Ok(Rgb::new(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => {
                let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
                Ok(Rgb::new(byte(0)?, byte(2)?, byte(4)?))
            }
            _ => Err(invalid()),
        }
    }

    /// Component-wise average, rounded down.
    pub fn average(self, other: Rgb) -> Rgb {
        let mid = |a: u8, b: u8| ((a as u16 + b as u16) / 2) as u8;
        Rgb::new(mid(self.r, other.r), mid(self.g, other.g), mid(self.b, other.b))
    }

    /// High 4 bits of each channel, for 12-bit color encodings.
    pub fn nibbles(self) -> [u8; 3] {
        [self.r >> 4, self.g >> 4, self.b >> 4]
    }
}

impl FromStr for Rgb {
    type Err = AlienFxError;

    fn from_str(s: &str) -> Result<Self> {
        Rgb::from_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = AlienFxError;

    fn try_from(value: String) -> Result<Self> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}
