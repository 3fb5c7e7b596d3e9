//! # Identity Claims
//!
//! The input assertion the pipeline is asked to verify: who the caller
//! believes an individual is (name, CRD) and where they believe the
//! individual works (firm CRD or firm name).
//!
//! [`ClaimFeatures`] is the precomputed presence tuple the search layer
//! keys its strategy decision table on. Keeping it a plain four-bool
//! struct makes the table exhaustively testable — sixteen rows, no nested
//! conditionals.

use serde::{Deserialize, Serialize};

use crate::identity::{BatchId, CrdNumber, OrgCrd, ReferenceId};

/// An identity claim submitted for due diligence.
///
/// At least one of {CRD, name} must be present for the claim to reach the
/// search layer; an empty claim is legal input but always resolves to the
/// "insufficient identifiers" outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Full name as supplied by the caller, if given as one string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individual_name: Option<String>,
    /// Name parts, used when the caller supplies a split name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Middle name or initial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Generational suffix (Jr, III, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// The individual's CRD number, if the caller knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crd: Option<CrdNumber>,
    /// The employing firm's CRD number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_crd: Option<OrgCrd>,
    /// The employing firm's name, resolved to a CRD via the org directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    /// Declared license type ("B", "IA", "B/IA", ...), if the caller
    /// asserts one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_type: Option<String>,
    /// Stable key for this claim across repeated runs.
    pub reference_id: ReferenceId,
    /// Batch this claim is processed under.
    pub batch_id: BatchId,
}

impl Claim {
    /// The name the pipeline should expect to find upstream.
    ///
    /// Prefers the single-string name; otherwise joins the non-empty parts
    /// in first-middle-last-suffix order. Returns `None` when the claim
    /// carries no name at all.
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = non_empty(self.individual_name.as_deref()) {
            return Some(name.to_string());
        }
        let parts: Vec<&str> = [
            self.first_name.as_deref(),
            self.middle_name.as_deref(),
            self.last_name.as_deref(),
            self.suffix.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Presence tuple driving the strategy decision table.
    pub fn features(&self) -> ClaimFeatures {
        ClaimFeatures {
            has_crd: self.crd.is_some(),
            has_org_crd: self.organization_crd.is_some(),
            has_org_name: non_empty(self.organization_name.as_deref()).is_some(),
            has_name: self.display_name().is_some(),
        }
    }

    /// Check the mandatory-field rule applied before the claim is allowed
    /// to reach the strategy resolver.
    ///
    /// Returns the deterministic skip reason for claims that must instead
    /// receive a synthetic skip evaluation.
    pub fn validate(&self) -> Result<(), String> {
        let f = self.features();
        if !f.has_crd && !f.has_name {
            return Err("claim carries neither an individual CRD nor an individual name".into());
        }
        Ok(())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Which identifying fields a claim carries.
///
/// The search layer's decision table is keyed on this tuple; see
/// `rdd-search::resolve_strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimFeatures {
    /// The claim carries an individual CRD.
    pub has_crd: bool,
    /// The claim carries an organization CRD.
    pub has_org_crd: bool,
    /// The claim carries a non-empty organization name.
    pub has_org_name: bool,
    /// The claim carries an individual name (single string or parts).
    pub has_name: bool,
}

impl ClaimFeatures {
    /// Whether the claim carries any organization information at all.
    pub fn has_org(&self) -> bool {
        self.has_org_crd || self.has_org_name
    }
}
