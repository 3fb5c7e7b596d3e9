//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout the stack. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Upstream-source conditions are a closed taxonomy ([`SourceError`]):
//!   rate limiting, unavailability, and timeout are tagged variants matched
//!   at the strategy layer, never a generic failure.
//! - [`NormalizationError::NoActionableRecords`] is the one error that is
//!   allowed to propagate to the caller: a non-empty action payload that
//!   yields zero records signals an upstream shape change, and swallowing
//!   it would corrupt due-diligence counts downstream.
//! - Store errors carry the offending path.

use thiserror::Error;

use crate::identity::SourceTag;

/// Top-level error type for the due-diligence stack.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Upstream data-source condition.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Payload normalization failure.
    #[error("normalization error: {0}")]
    Normalization(#[from] NormalizationError),

    /// Blob/cache/report store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Upstream data-source conditions.
///
/// Rate limiting is a first-class signal, not a failure: it aborts only the
/// current source call and lets fallback strategies proceed.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source told us to stop calling it right now.
    #[error("{source} rate limited the current session")]
    RateLimited {
        /// The source that signalled the limit.
        source: SourceTag,
    },

    /// The source could not be reached or returned an unusable response.
    #[error("{source} unavailable: {reason}")]
    Unavailable {
        /// The source that failed.
        source: SourceTag,
        /// Raw error text, embedded verbatim in the search explanation.
        reason: String,
    },

    /// The call timed out after the configured retries.
    #[error("{source} timed out after {attempts} attempt(s)")]
    Timeout {
        /// The source that timed out.
        source: SourceTag,
        /// Number of attempts made before giving up.
        attempts: u32,
    },
}

impl SourceError {
    /// The source this error originated from.
    pub fn source_tag(&self) -> SourceTag {
        match self {
            Self::RateLimited { source }
            | Self::Unavailable { source, .. }
            | Self::Timeout { source, .. } => *source,
        }
    }
}

/// Payload normalization failures.
#[derive(Error, Debug)]
pub enum NormalizationError {
    /// A non-empty action payload produced zero extractable records.
    ///
    /// This propagates: it means the upstream response shape changed and
    /// the normalizer is silently blind to real records.
    #[error("{source} returned a non-empty {operation} payload with no actionable records")]
    NoActionableRecords {
        /// The source whose shape changed.
        source: SourceTag,
        /// The operation whose payload could not be read.
        operation: String,
    },

    /// The payload is not the JSON structure the source contract promises.
    #[error("{source} payload malformed: {reason}")]
    MalformedPayload {
        /// The source whose payload failed to parse.
        source: SourceTag,
        /// What was wrong with it.
        reason: String,
    },

    /// The organization directory table could not be loaded.
    #[error("org directory unreadable: {reason}")]
    OrgDirectory {
        /// What was wrong with it.
        reason: String,
    },
}

/// Blob-store and cache-layer failures.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem-level failure.
    #[error("io error at {path}: {source}")]
    Io {
        /// The path being read or written.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stored document failed to deserialize.
    #[error("corrupt stored document at {path}: {reason}")]
    Corrupt {
        /// The path of the unreadable document.
        path: String,
        /// Parse failure detail.
        reason: String,
    },

    /// A stored file name did not follow the naming convention.
    #[error("unparseable store file name: {name}")]
    BadFileName {
        /// The offending file name.
        name: String,
    },
}

impl StoreError {
    /// Wrap an `std::io::Error` with the path it occurred on.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
