//! Hardware validation tools.

pub mod block_tester;

pub use block_tester::{BlockTester, CatalogReport, ProbeOutcome, TestPlan, ZoneOutcome};
