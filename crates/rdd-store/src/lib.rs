//! # rdd-store — Caching & Versioned Persistence
//!
//! Everything the pipeline persists goes through the [`BlobStore`]
//! abstraction, so a local filesystem and a cloud object store are
//! interchangeable backends. On top of it sit two stores with very
//! different write disciplines:
//!
//! - [`QueryCache`] — TTL-bounded cache of upstream query results, gated
//!   by a per-(batch, source) manifest so freshness checks never parse the
//!   payload files themselves.
//! - [`ReportStore`] — append-only, versioned compliance-report snapshots.
//!   A new version is written only when the report's tracked fields
//!   actually changed; identical re-runs are a deliberate no-op.

pub mod blob;
pub mod cache;
pub mod reports;

pub use blob::{BlobStore, LocalBlobStore, MemoryBlobStore};
pub use cache::{CacheKey, QueryCache, DEFAULT_CACHE_TTL_DAYS};
pub use reports::{ReportStore, SaveOutcome};
