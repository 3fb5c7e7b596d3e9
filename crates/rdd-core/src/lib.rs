//! # rdd-core — Foundational Types for the Due-Diligence Stack
//!
//! This crate is the bedrock of the RDD stack. It defines the data model
//! shared by every other crate: the input [`Claim`], the reconciled
//! [`IndividualRecord`], normalized [`ActionRecord`]s, severity-tagged
//! [`Alert`]s, per-category [`EvaluationSection`]s, and the versioned
//! [`ComplianceReport`]. Every other crate in the workspace depends on
//! `rdd-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** [`CrdNumber`], [`OrgCrd`],
//!    [`ReferenceId`], [`BatchId`] — all newtypes with validated
//!    constructors. No bare strings for identifiers.
//!
//! 2. **Immutable value objects.** A canonical record is produced fresh per
//!    search and never mutated afterwards; alerts and reports are
//!    write-once. Downstream stages read, they do not patch.
//!
//! 3. **Single [`Category`] enum.** One definition, fixed declaration order,
//!    exhaustive `match` everywhere. Adding a category forces every
//!    consumer (engine, builder, store diff) to handle it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `rdd-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod action;
pub mod claim;
pub mod error;
pub mod identity;
pub mod record;
pub mod report;

pub use action::{ActionKind, ActionRecord, DueDiligenceCounters};
pub use claim::{Claim, ClaimFeatures};
pub use error::{CoreError, NormalizationError, SourceError, StoreError};
pub use identity::{BatchId, CrdNumber, IdentityError, OrgCrd, ReferenceId, SourceTag};
pub use record::{BranchOffice, Disclosure, DisclosureType, Employment, ExamCategory, IndividualRecord};
pub use report::{
    Alert, Category, ComplianceReport, EvaluationSection, FinalEvaluation, Severity, TrackedFields,
};
