//! Theme persistence.
//!
//! Themes are stored as JSON keyed by region name, so a file stays valid as
//! long as the model it was written for keeps those region names.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::ComputerModel;
use crate::error::Result;
use crate::model::{Mode, Rgb, Theme};

// =============================================================================
// Storage Structures
// =============================================================================

/// Stored zone. Sub-ids are not stored; they follow from zone order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredZone {
    #[serde(default)]
    pub mode: Mode,
    pub left: Rgb,
    /// Defaults to `left` when omitted.
    #[serde(default)]
    pub right: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArea {
    pub region: String,
    pub zones: Vec<StoredZone>,
}

/// Stored theme for one computer model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTheme {
    pub name: String,
    /// Name of the computer model this theme was written for.
    pub model: String,
    pub areas: Vec<StoredArea>,
}

impl StoredTheme {
    pub fn from_theme(theme: &Theme, model: &ComputerModel) -> Self {
        let areas = theme
            .areas()
            .iter()
            .map(|area| StoredArea {
                region: area.region().name.clone(),
                zones: area
                    .zones()
                    .iter()
                    .map(|zone| StoredZone {
                        mode: zone.mode(),
                        left: zone.left_color(),
                        right: Some(zone.right_color()),
                    })
                    .collect(),
            })
            .collect();

        Self {
            name: theme.name().into(),
            model: model.name.clone(),
            areas,
        }
    }

    /// Rebuild a theme against `model`'s regions.
    ///
    /// # Errors
    /// Returns `UnknownRegion` if an area names a region the model lacks.
    pub fn into_theme(self, model: &ComputerModel) -> Result<Theme> {
        let mut theme = Theme::new(&self.name);
        for stored in self.areas {
            let region = model.region(&stored.region)?;
            let area = theme.bind(region.clone());
            for zone in stored.zones {
                let right = zone.right.unwrap_or(zone.left);
                area.add_zone_with(zone.mode, zone.left, right)?;
            }
        }
        Ok(theme)
    }
}

// =============================================================================
// Load / Save
// =============================================================================

pub fn load_theme(path: &Path) -> Result<StoredTheme> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_theme(path: &Path, theme: &StoredTheme) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(theme)?;
    std::fs::write(path, content)?;
    Ok(())
}
