//! Hardware catalog.
//!
//! Maps each supported computer model to its USB ids, its lighting regions
//! and the byte layout its controller speaks. The built-in table can be
//! replaced by a JSON file of the same shape.

mod builtin;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::compiler::Compiler;
use crate::error::{AlienFxError, Result};
use crate::model::HardwareRegion;
use crate::protocol::Encoding;

// =============================================================================
// ComputerModel
// =============================================================================

/// One supported computer model.
#[derive(Debug, Clone)]
pub struct ComputerModel {
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Regions in catalog order.
    pub regions: Vec<Arc<HardwareRegion>>,
    pub encoding: Encoding,
}

impl ComputerModel {
    /// Find a region by name.
    pub fn region(&self, name: &str) -> Result<&Arc<HardwareRegion>> {
        self.regions
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AlienFxError::UnknownRegion(name.into()))
    }

    pub fn lightable_regions(&self) -> impl Iterator<Item = &Arc<HardwareRegion>> {
        self.regions.iter().filter(|r| r.can_light)
    }

    /// Compiler for this model's encoding.
    pub fn compiler(&self) -> Compiler<'_> {
        Compiler::new(&self.encoding)
    }

    fn validate(&self) -> Result<()> {
        self.encoding
            .validate()
            .map_err(|e| AlienFxError::InvalidCatalog(format!("{}: {}", self.name, e)))?;

        let mut seen = HashSet::new();
        for region in &self.regions {
            if !seen.insert(region.name.to_lowercase()) {
                return Err(AlienFxError::InvalidCatalog(format!(
                    "{}: duplicate region '{}'",
                    self.name, region.name
                )));
            }
            if region.max_commands == 0 {
                return Err(AlienFxError::InvalidCatalog(format!(
                    "{}: region '{}' has no command slots",
                    self.name, region.name
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for ComputerModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:04x}:{:04x}, {} regions)",
            self.name,
            self.vendor_id,
            self.product_id,
            self.regions.len()
        )
    }
}

/// On-disk form of a model.
#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
    vendor_id: u16,
    product_id: u16,
    regions: Vec<HardwareRegion>,
    #[serde(default)]
    encoding: Encoding,
}

impl From<ModelEntry> for ComputerModel {
    fn from(entry: ModelEntry) -> Self {
        Self {
            name: entry.name,
            vendor_id: entry.vendor_id,
            product_id: entry.product_id,
            regions: entry.regions.into_iter().map(Arc::new).collect(),
            encoding: entry.encoding,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    models: Vec<ModelEntry>,
}

// =============================================================================
// Catalog
// =============================================================================

/// Read-only table of computer models.
#[derive(Debug, Clone)]
pub struct Catalog {
    models: Vec<ComputerModel>,
}

impl Catalog {
    /// Catalog of the models this crate knows about out of the box.
    pub fn builtin() -> Self {
        Self {
            models: builtin::models(),
        }
    }

    /// Build a catalog from models, validating each.
    pub fn new(models: Vec<ComputerModel>) -> Result<Self> {
        for model in &models {
            model.validate()?;
        }
        Ok(Self { models })
    }

    /// Parse a catalog from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.models.into_iter().map(ComputerModel::from).collect())
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        info!(
            "Loaded {} models from {}",
            catalog.models.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn models(&self) -> &[ComputerModel] {
        &self.models
    }

    /// Find a model by name, ignoring case.
    pub fn find(&self, name: &str) -> Result<&ComputerModel> {
        self.models
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AlienFxError::UnknownModel(name.into()))
    }

    pub fn find_by_ids(&self, vendor_id: u16, product_id: u16) -> Option<&ComputerModel> {
        self.models
            .iter()
            .find(|m| m.vendor_id == vendor_id && m.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{SIMULATED_PRODUCT_ID, SIMULATED_VENDOR_ID};

    #[test]
    fn test_builtin_is_valid() {
        let catalog = Catalog::builtin();
        assert!(Catalog::new(catalog.models().to_vec()).is_ok());

        let simulated = catalog
            .find_by_ids(SIMULATED_VENDOR_ID, SIMULATED_PRODUCT_ID)
            .unwrap();
        assert!(catalog.find(&simulated.name.to_uppercase()).is_ok());
    }

    #[test]
    fn test_unknown_lookups() {
        let catalog = Catalog::builtin();
        assert!(matches!(
            catalog.find("Aurora"),
            Err(AlienFxError::UnknownModel(_))
        ));
        let model = &catalog.models()[0];
        assert!(matches!(
            model.region("trunk"),
            Err(AlienFxError::UnknownRegion(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let catalog = Catalog::from_json_str(
            r#"{"models": [{
                "name": "Bench",
                "vendor_id": 6268,
                "product_id": 1300,
                "regions": [
                    {"name": "keyboard", "hex_id": 16, "max_commands": 4, "can_blink": true},
                    {"name": "bezel", "hex_id": 112, "max_commands": 1, "can_light": false}
                ]
            }]}"#,
        )
        .unwrap();

        let model = catalog.find("bench").unwrap();
        assert_eq!(model.encoding, Encoding::default());
        assert_eq!(model.lightable_regions().count(), 1);
        assert!(model.region("KEYBOARD").unwrap().can_blink);
    }

    #[test]
    fn test_rejects_bad_models() {
        let duplicate = r#"{"models": [{"name": "X", "vendor_id": 1, "product_id": 2, "regions": [
            {"name": "logo", "hex_id": 48, "max_commands": 1},
            {"name": "Logo", "hex_id": 64, "max_commands": 1}
        ]}]}"#;
        assert!(matches!(
            Catalog::from_json_str(duplicate),
            Err(AlienFxError::InvalidCatalog(_))
        ));

        let empty_budget = r#"{"models": [{"name": "X", "vendor_id": 1, "product_id": 2, "regions": [
            {"name": "logo", "hex_id": 48, "max_commands": 0}
        ]}]}"#;
        assert!(matches!(
            Catalog::from_json_str(empty_budget),
            Err(AlienFxError::InvalidCatalog(_))
        ));

        let short_packets = r#"{"models": [{"name": "X", "vendor_id": 1, "product_id": 2,
            "regions": [], "encoding": {"packet_len": 4}}]}"#;
        assert!(Catalog::from_json_str(short_packets).is_err());
    }
}
