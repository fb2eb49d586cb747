//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the aggregation core and the warehouse connector.

mod cohort_source;
mod query;

pub use cohort_source::{CohortSource, ExecutionMode};
pub use query::{evaluate, Aggregate, CohortQuery, QueryOutput, QueryRow};
