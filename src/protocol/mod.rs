//! USB control-transfer protocol for AlienFX devices.
//!
//! This module contains the per-model encoding tables, the command packet
//! builders and status report parsing.

pub mod command;
pub mod encoding;
pub mod status;

pub use command::*;
pub use encoding::*;
pub use status::*;
