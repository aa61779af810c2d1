//! Build store adapters.
//!
//! [`BuildStore`] is the only view the report locator and reader have of CI
//! storage. [`local::LocalBuildStore`] reads a mirror of the Prow bucket
//! layout from disk; [`memory::MemoryBuildStore`] holds builds in memory.

pub mod local;
pub mod memory;
pub mod traits;

pub use traits::BuildStore;
