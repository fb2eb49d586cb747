//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `sqlite`: SQLite-backed cohort warehouse with query pushdown
//! - `memory`: in-memory cohort (eager only)
//! - `redact`: credential filtering for logs

pub mod memory;
pub mod redact;
pub mod sqlite;

pub use memory::MemoryCohort;
pub use sqlite::{SourceError, SqliteCohort};
