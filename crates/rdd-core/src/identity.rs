//! # Domain Identity Newtypes
//!
//! Newtype wrappers for every identifier in the due-diligence pipeline.
//! These prevent accidental identifier confusion — you cannot pass an
//! individual's CRD where a firm CRD is expected, or a batch id where a
//! reference id is expected.
//!
//! CRDs are held as validated digit strings rather than integers: upstream
//! payloads carry them as strings and leading zeros must round-trip through
//! cache files and report snapshots unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The upstream regulator systems the pipeline queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    /// FINRA BrokerCheck individual registry.
    #[serde(rename = "FINRA_BROKERCHECK")]
    BrokerCheck,
    /// SEC Investment Adviser Public Disclosure registry.
    #[serde(rename = "SEC_IAPD")]
    SecIapd,
    /// FINRA disciplinary-action records.
    #[serde(rename = "FINRA_DISCIPLINARY")]
    FinraDisciplinary,
    /// FINRA arbitration awards.
    #[serde(rename = "FINRA_ARBITRATION")]
    FinraArbitration,
    /// SEC enforcement / administrative proceedings.
    #[serde(rename = "SEC_ENFORCEMENT")]
    SecEnforcement,
}

impl SourceTag {
    /// The stable wire/file-name label for this source.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BrokerCheck => "FINRA_BROKERCHECK",
            Self::SecIapd => "SEC_IAPD",
            Self::FinraDisciplinary => "FINRA_DISCIPLINARY",
            Self::FinraArbitration => "FINRA_ARBITRATION",
            Self::SecEnforcement => "SEC_ENFORCEMENT",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// `thiserror` treats error-struct fields named `source` as the error cause,
// which requires this type to implement `std::error::Error`.
impl std::error::Error for SourceTag {}

/// Validate that a string is a non-empty ASCII-digit identifier.
fn validate_digits(raw: &str, what: &'static str) -> Result<String, IdentityError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentityError::Empty { what });
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(IdentityError::NonNumeric {
            what,
            value: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Identifier construction failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The identifier was empty or whitespace.
    #[error("{what} is required")]
    Empty {
        /// Which identifier kind was empty.
        what: &'static str,
    },

    /// The identifier contained non-digit characters.
    #[error("{what} must be numeric, got {value:?}")]
    NonNumeric {
        /// Which identifier kind was malformed.
        what: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The identifier is not safe to embed in a store file name.
    #[error("{what} must be a file-name-safe token, got {value:?}")]
    UnsafeForFileName {
        /// Which identifier kind was malformed.
        what: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// An individual's Central Registration Depository number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrdNumber(String);

impl CrdNumber {
    /// Create a validated individual CRD from a digit string.
    pub fn new(raw: &str) -> Result<Self, IdentityError> {
        validate_digits(raw, "individual CRD").map(Self)
    }

    /// The CRD as the digit string upstream systems expect.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CrdNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A firm's (organization's) CRD number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgCrd(String);

impl OrgCrd {
    /// Create a validated organization CRD from a digit string.
    pub fn new(raw: &str) -> Result<Self, IdentityError> {
        validate_digits(raw, "organization CRD").map(Self)
    }

    /// The organization CRD as a digit string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgCrd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-supplied stable key identifying one claim across repeated runs.
///
/// Used as the versioning key for report snapshots, so it must be safe to
/// embed in a file name: construction rejects path separators and
/// whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(String);

impl ReferenceId {
    /// Create a validated reference id.
    pub fn new(raw: &str) -> Result<Self, IdentityError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty {
                what: "reference id",
            });
        }
        if trimmed
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace())
        {
            return Err(IdentityError::UnsafeForFileName {
                what: "reference id",
                value: trimmed.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The reference id as a file-name-safe token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Employee/batch correlation id grouping claims processed together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(String);

impl BatchId {
    /// Create a validated batch id (same file-name-safety rule as
    /// [`ReferenceId`]).
    pub fn new(raw: &str) -> Result<Self, IdentityError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty { what: "batch id" });
        }
        if trimmed
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace())
        {
            return Err(IdentityError::UnsafeForFileName {
                what: "batch id",
                value: trimmed.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generate a random batch id for callers that supply none.
    pub fn generate() -> Self {
        Self(format!("batch-{}", Uuid::new_v4()))
    }

    /// The batch id as a file-name-safe token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
