//! Zones: the smallest independently colorable unit inside an area.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Rgb;
use crate::error::{AlienFxError, Result};

/// Lighting effect for a zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Steady left color.
    #[default]
    Fixed,
    /// Left color switching on and off.
    Blink,
    /// Gradient from left to right color.
    Morph,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Fixed, Mode::Blink, Mode::Morph];

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Fixed => "fixed",
            Mode::Blink => "blink",
            Mode::Morph => "morph",
        }
    }
}

impl FromStr for Mode {
    type Err = AlienFxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(Mode::Fixed),
            "blink" => Ok(Mode::Blink),
            "morph" => Ok(Mode::Morph),
            _ => Err(AlienFxError::InvalidMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One addressable sub-region owned by an [`Area`](super::Area).
///
/// Zones are only created by their area, which also owns `sub_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    sub_id: u8,
    mode: Mode,
    left_color: Rgb,
    right_color: Rgb,
    middle_color: Rgb,
}

impl Zone {
    pub(crate) fn new(sub_id: u8) -> Self {
        Self {
            sub_id,
            mode: Mode::Fixed,
            left_color: Rgb::BLACK,
            right_color: Rgb::BLACK,
            middle_color: Rgb::BLACK,
        }
    }

    pub(crate) fn set_sub_id(&mut self, sub_id: u8) {
        self.sub_id = sub_id;
    }

    pub fn sub_id(&self) -> u8 {
        self.sub_id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn left_color(&self) -> Rgb {
        self.left_color
    }

    pub fn right_color(&self) -> Rgb {
        self.right_color
    }

    /// Average of left and right, used for gradient previews.
    pub fn middle_color(&self) -> Rgb {
        self.middle_color
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Set the mode from user input.
    ///
    /// # Errors
    /// Returns `InvalidMode` and keeps the current mode if `mode` is unknown.
    pub fn set_mode_str(&mut self, mode: &str) -> Result<()> {
        self.mode = mode.parse()?;
        Ok(())
    }

    /// Set the left color from a hex string.
    ///
    /// # Errors
    /// Returns `InvalidColor` and keeps the current color on bad input.
    pub fn set_left_color(&mut self, hex: &str) -> Result<()> {
        let color = Rgb::from_hex(hex)?;
        self.set_left_rgb(color);
        Ok(())
    }

    /// Set the right color from a hex string.
    ///
    /// # Errors
    /// Returns `InvalidColor` and keeps the current color on bad input.
    pub fn set_right_color(&mut self, hex: &str) -> Result<()> {
        let color = Rgb::from_hex(hex)?;
        self.set_right_rgb(color);
        Ok(())
    }

    pub fn set_left_rgb(&mut self, color: Rgb) {
        self.left_color = color;
        self.refresh_middle();
    }

    pub fn set_right_rgb(&mut self, color: Rgb) {
        self.right_color = color;
        self.refresh_middle();
    }

    pub fn set_colors(&mut self, left: Rgb, right: Rgb) {
        self.left_color = left;
        self.right_color = right;
        self.refresh_middle();
    }

    fn refresh_middle(&mut self) {
        self.middle_color = self.left_color.average(self.right_color);
    }
}
