//! # rdd-source — Upstream Data Sources & Normalization
//!
//! The core sees upstream fetchers only through the [`DataSource`] trait,
//! which returns nullable semi-structured payloads or a tagged
//! [`SourceError`]. This crate owns that seam and everything between it
//! and the canonical data model:
//!
//! - [`traits`] — the `DataSource` trait and a scripted mock for tests.
//! - [`http`] — blocking HTTP clients for the two public registries.
//! - [`normalize`] — registry payloads → [`rdd_core::IndividualRecord`],
//!   including the per-source two-stage JSON-in-JSON decode.
//! - [`exams`] — the fixed, longest-pattern-first exam label table.
//! - [`actions`] — disciplinary/arbitration/regulatory payloads →
//!   [`rdd_core::ActionRecord`]s, with the shape-change tripwire.
//! - [`orgs`] — the cached organization-name → CRD directory.

pub mod actions;
pub mod exams;
pub mod http;
pub mod normalize;
pub mod orgs;
pub mod traits;

pub use actions::normalize_actions;
pub use exams::recognize_exam;
pub use http::{HttpRegistrySource, RegistryConfig};
pub use normalize::normalize_individual;
pub use orgs::OrgDirectory;
pub use traits::{DataSource, MockFailure, MockSource};
