//! AlienFX Rust Library
//!
//! A theme compiler and transmission engine for AlienFX-style laptop
//! lighting controllers.
//!
//! # Features
//!
//! - Edit themes as regions, areas and zones with validated colors and modes
//! - Compile themes into per-model command packets within hardware budgets
//! - Send commands over USB with the controller's readiness protocol
//! - Validate a model's catalog zone by zone, on hardware or simulated
//!
//! # Example
//!
//! ```
//! use alienfx_rust::catalog::Catalog;
//! use alienfx_rust::config::SessionConfig;
//! use alienfx_rust::device::{DeviceSession, SimulatedBus};
//! use alienfx_rust::model::{Mode, Rgb, Theme};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Catalog::builtin();
//!     let model = catalog.find("simulated")?;
//!
//!     // Two keyboard zones: steady red, then a red to blue morph
//!     let mut theme = Theme::new("demo");
//!     let keyboard = theme.bind(model.region("keyboard")?.clone());
//!     keyboard.add_zone_with(Mode::Fixed, Rgb::new(0xFF, 0, 0), Rgb::BLACK)?;
//!     keyboard.add_zone_with(Mode::Morph, Rgb::new(0xFF, 0, 0), Rgb::new(0, 0, 0xFF))?;
//!
//!     let program = model.compiler().program(&theme, 200)?;
//!
//!     let bus = SimulatedBus::new();
//!     let mut session = DeviceSession::open(
//!         &bus,
//!         model.vendor_id,
//!         model.product_id,
//!         &model.encoding,
//!         SessionConfig::default(),
//!     )?;
//!     session.send(&program)?;
//!     session.close();
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod compiler;
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod protocol;
pub mod storage;
pub mod utils;

// Re-exports for convenience
pub use catalog::{Catalog, ComputerModel};
pub use compiler::Compiler;
pub use device::{DeviceSession, SimulatedBus};
pub use diagnostics::BlockTester;
pub use error::{AlienFxError, Result};
pub use model::{Area, HardwareRegion, Mode, Rgb, Theme, Zone};
pub use protocol::Command;
