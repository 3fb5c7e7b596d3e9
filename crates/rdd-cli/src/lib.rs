//! # rdd-cli — Batch Driver for the Due-Diligence Stack
//!
//! Provides the `rdd` command-line interface.
//!
//! ## Subcommands
//!
//! - `rdd run` — Ingest a claims CSV and process every claim end to end:
//!   search, rule evaluation, report assembly, versioned persistence.
//! - `rdd ingest` — Dry-run header resolution: show which rows would be
//!   accepted and which diverted to the skip report.
//! - `rdd report` — Print the latest stored report for a reference id.
//!
//! Processing is single-claim-synchronous: each claim is resolved,
//! evaluated, and persisted before the next begins. The only shared state
//! between claims is the cache directory.

pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod run;
