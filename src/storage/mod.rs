//! Theme storage and persistence module.
//!
//! Handles saving and loading themes to/from disk.

pub mod themes;

// Re-export commonly used items
pub use themes::*;
