//! Theme compilation.
//!
//! Turns themes into ordered command sequences, enforcing per-region
//! command budgets and capability flags.

mod theme_compiler;

pub use theme_compiler::Compiler;
