//! Lighting data model: regions, areas, zones and themes.

pub mod area;
pub mod color;
pub mod region;
pub mod theme;
pub mod zone;

pub use area::Area;
pub use color::Rgb;
pub use region::HardwareRegion;
pub use theme::Theme;
pub use zone::{Mode, Zone};
