//! # rdd-search — Strategy Resolution & Execution
//!
//! Given a claim, pick the one legal lookup strategy, execute it against
//! the cache layer and the two registries, and hand back a
//! [`SearchOutcome`] — never a raw error. The decision table lives in
//! [`strategy`]; the cache-aware execution with its fallback rules lives
//! in [`resolver`].

pub mod resolver;
pub mod strategy;

pub use resolver::{SearchContext, SearchOutcome};
pub use strategy::{resolve_strategy, SearchStrategy};
