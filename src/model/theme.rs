//! Themes: a complete lighting configuration for one computer model.

use std::sync::Arc;

use super::{Area, HardwareRegion};

/// Ordered collection of areas, at most one per hardware region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Theme {
    name: String,
    areas: Vec<Area>,
}

impl Theme {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            areas: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Areas in declaration order.
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Get the area for `region`, creating it at the end if absent.
    ///
    /// Areas are keyed by region name. If an area with the same name is
    /// already bound, it is returned unchanged and `region` is ignored,
    /// even when its `hex_id` or budget differ.
    pub fn bind(&mut self, region: Arc<HardwareRegion>) -> &mut Area {
        let index = match self.position(&region.name) {
            Some(index) => index,
            None => {
                self.areas.push(Area::new(region));
                self.areas.len() - 1
            }
        };
        &mut self.areas[index]
    }

    pub fn area(&self, region_name: &str) -> Option<&Area> {
        self.position(region_name).map(|i| &self.areas[i])
    }

    pub fn area_mut(&mut self, region_name: &str) -> Option<&mut Area> {
        self.position(region_name).map(|i| &mut self.areas[i])
    }

    /// Drop the area bound to `region_name`.
    pub fn unbind(&mut self, region_name: &str) -> Option<Area> {
        self.position(region_name).map(|i| self.areas.remove(i))
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Total zones across all areas.
    pub fn zone_count(&self) -> usize {
        self.areas.iter().map(Area::len).sum()
    }

    fn position(&self, region_name: &str) -> Option<usize> {
        self.areas.iter().position(|a| a.region().name == region_name)
    }
}
