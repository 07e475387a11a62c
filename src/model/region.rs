//! Physical lighting regions from the hardware catalog.

use serde::{Deserialize, Serialize};

use super::Mode;

/// One physical lighting block on a computer model.
///
/// Loaded once from the catalog and shared read-only by every
/// [`Area`](super::Area) bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareRegion {
    /// Unique within a computer model (e.g. "keyboard", "logo").
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Base protocol address. Zone sub-ids count up from here.
    pub hex_id: u8,
    /// Hardware command-slot budget for all zones of this region.
    pub max_commands: u16,
    #[serde(default = "default_true")]
    pub can_light: bool,
    #[serde(default)]
    pub can_blink: bool,
    #[serde(default)]
    pub can_morph: bool,
}

fn default_true() -> bool {
    true
}

impl HardwareRegion {
    /// A region that supports every mode.
    pub fn new(name: &str, description: &str, hex_id: u8, max_commands: u16) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            hex_id,
            max_commands,
            can_light: true,
            can_blink: true,
            can_morph: true,
        }
    }

    /// Set capability flags.
    pub fn with_capabilities(mut self, can_light: bool, can_blink: bool, can_morph: bool) -> Self {
        self.can_light = can_light;
        self.can_blink = can_blink;
        self.can_morph = can_morph;
        self
    }

    /// Whether this region can display a zone in `mode`.
    ///
    /// A region that cannot light supports no mode at all.
    pub fn supports(&self, mode: Mode) -> bool {
        self.can_light
            && match mode {
                Mode::Fixed => true,
                Mode::Blink => self.can_blink,
                Mode::Morph => self.can_morph,
            }
    }

    /// Modes this region supports, in declaration order.
    pub fn supported_modes(&self) -> Vec<Mode> {
        Mode::ALL.into_iter().filter(|&m| self.supports(m)).collect()
    }

    /// Highest zone sub-id within the command budget.
    ///
    /// `None` if the budget is zero or runs past `0xFF`.
    pub fn last_sub_id(&self) -> Option<u8> {
        let span = self.max_commands.checked_sub(1)?;
        u8::try_from((self.hex_id as u16).saturating_add(span)).ok()
    }
}

impl std::fmt::Display for HardwareRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:#04x})", self.name, self.hex_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let region = HardwareRegion::new("logo", "Alien head", 0x30, 1).with_capabilities(true, true, false);
        assert!(region.supports(Mode::Fixed));
        assert!(region.supports(Mode::Blink));
        assert!(!region.supports(Mode::Morph));
        assert_eq!(region.supported_modes(), vec![Mode::Fixed, Mode::Blink]);

        let dark = HardwareRegion::new("bezel", "", 0x70, 1).with_capabilities(false, true, true);
        assert!(dark.supported_modes().is_empty());
    }

    #[test]
    fn test_last_sub_id() {
        assert_eq!(HardwareRegion::new("kb", "", 0x10, 4).last_sub_id(), Some(0x13));
        assert_eq!(HardwareRegion::new("kb", "", 0xFE, 4).last_sub_id(), None);
        assert_eq!(HardwareRegion::new("kb", "", 0x10, 0).last_sub_id(), None);
    }

    #[test]
    fn test_deserialize_defaults() {
        let region: HardwareRegion =
            serde_json::from_str(r#"{"name": "power", "hex_id": 80, "max_commands": 2}"#).unwrap();
        assert!(region.can_light);
        assert!(!region.can_blink);
        assert!(!region.can_morph);
        assert!(region.description.is_empty());
    }
}
