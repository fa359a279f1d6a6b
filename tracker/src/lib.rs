//! Fitness tracker contract shared by the grader and graded candidates.
//!
//! - **[`model`]**: the dataset, record, and tier types.
//! - **[`contract`]**: the [`contract::FitnessTracker`] trait and the expected
//!   operation signatures.
//! - **[`signature`]**: manifest verification for out-of-process candidates.
//! - **[`protocol`]**: JSON request/response types for out-of-process candidates.

pub mod contract;
pub mod model;
pub mod protocol;
pub mod signature;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
