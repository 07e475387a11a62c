//! Areas bind one hardware region to an ordered list of zones.

use std::sync::Arc;

use super::{HardwareRegion, Mode, Rgb, Zone};
use crate::error::{AlienFxError, Result};

/// Theme-side binding of a [`HardwareRegion`] to its zones.
///
/// The `i`-th zone always has `sub_id == region.hex_id + i`. Ids are
/// re-derived after every insertion or removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    region: Arc<HardwareRegion>,
    zones: Vec<Zone>,
}

impl Area {
    pub fn new(region: Arc<HardwareRegion>) -> Self {
        Self {
            region,
            zones: Vec::new(),
        }
    }

    pub fn region(&self) -> &HardwareRegion {
        &self.region
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, index: usize) -> Option<&Zone> {
        self.zones.get(index)
    }

    pub fn zone_mut(&mut self, index: usize) -> Option<&mut Zone> {
        self.zones.get_mut(index)
    }

    /// Find a zone by its protocol sub-id.
    pub fn zone_by_sub_id(&self, sub_id: u8) -> Option<&Zone> {
        let index = sub_id.checked_sub(self.region.hex_id)?;
        self.zones.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Append a dark fixed zone with the next sequential sub-id.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the next sub-id would not fit in a byte.
    pub fn add_zone(&mut self) -> Result<&mut Zone> {
        let sub_id = self.sub_id_for(self.zones.len()).ok_or_else(|| {
            AlienFxError::InvalidInput(format!(
                "Region '{}' cannot address more than {} zones",
                self.region.name,
                self.zones.len()
            ))
        })?;
        self.zones.push(Zone::new(sub_id));
        let index = self.zones.len() - 1;
        Ok(&mut self.zones[index])
    }

    /// Append a zone with the given mode and colors.
    pub fn add_zone_with(&mut self, mode: Mode, left: Rgb, right: Rgb) -> Result<&mut Zone> {
        let zone = self.add_zone()?;
        zone.set_mode(mode);
        zone.set_colors(left, right);
        Ok(zone)
    }

    /// Remove the zone at `index`, renumbering the rest from `hex_id`.
    pub fn remove_zone(&mut self, index: usize) -> Option<Zone> {
        if index >= self.zones.len() {
            return None;
        }
        let removed = self.zones.remove(index);
        self.renumber();
        Some(removed)
    }

    fn renumber(&mut self) {
        let base = self.region.hex_id;
        for (i, zone) in self.zones.iter_mut().enumerate() {
            // Ids below the current length were valid before the removal.
            zone.set_sub_id(base.wrapping_add(i as u8));
        }
    }

    fn sub_id_for(&self, index: usize) -> Option<u8> {
        let offset = u8::try_from(index).ok()?;
        self.region.hex_id.checked_add(offset)
    }
}
