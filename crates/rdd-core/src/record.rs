//! # Canonical Individual Record
//!
//! The reconciled output of source normalization. Both registries answer in
//! their own shape; the normalizer in `rdd-source` maps either shape into
//! this one record, and every downstream stage (rule engine, report
//! builder) reads only this.
//!
//! A record is produced fresh per search and never mutated after creation.
//! Absence of data is a valid state — an all-empty record is how a registry
//! miss is represented, not an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identity::{CrdNumber, OrgCrd, SourceTag};

/// The reconciled view of one individual as reported by a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualRecord {
    /// Which registry answered.
    pub source: SourceTag,
    /// The matched CRD, when the registry returned one.
    pub crd: Option<CrdNumber>,
    /// Full name as reported by the registry.
    pub fetched_name: String,
    /// Alternate names (maiden names, prior legal names) on file.
    pub other_names: Vec<String>,
    /// Broker-registration scope status string (e.g. "Active", "InActive").
    pub broker_scope: Option<String>,
    /// Investment-adviser scope status string.
    pub ia_scope: Option<String>,
    /// Disclosure events on the individual's record.
    pub disclosures: Vec<Disclosure>,
    /// Canonical tags for the exams the individual has passed.
    pub exams: Vec<ExamCategory>,
    /// Current employment entries.
    pub employments: Vec<Employment>,
}

impl IndividualRecord {
    /// An all-empty record for the given source — how a registry miss is
    /// represented.
    pub fn empty(source: SourceTag) -> Self {
        Self {
            source,
            crd: None,
            fetched_name: String::new(),
            other_names: Vec::new(),
            broker_scope: None,
            ia_scope: None,
            disclosures: Vec::new(),
            exams: Vec::new(),
            employments: Vec::new(),
        }
    }

    /// Whether the registry actually returned an individual.
    pub fn is_empty(&self) -> bool {
        self.crd.is_none() && self.fetched_name.trim().is_empty()
    }

    /// Whether a scope string reports an active registration.
    pub fn scope_is_active(scope: Option<&str>) -> bool {
        scope
            .map(|s| s.trim().eq_ignore_ascii_case("active"))
            .unwrap_or(false)
    }
}

/// A reported disclosure event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disclosure {
    /// When the event occurred, as reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,
    /// The event's category.
    pub disclosure_type: DisclosureType,
    /// Resolution string as reported ("Final", "Settled", "Pending", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Type-specific detail fields, kept verbatim from the source.
    #[serde(default)]
    pub detail: serde_json::Value,
}

/// The category of a disclosure event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisclosureType {
    /// Regulator-initiated action against the individual.
    Regulatory,
    /// Customer-initiated dispute or complaint.
    CustomerDispute,
    /// Criminal matter.
    Criminal,
    /// Civil judicial matter.
    Civil,
    /// Unpaid judgment or lien.
    Judgment,
    /// Any category the normalizer does not recognize, kept verbatim.
    Other(String),
}

impl DisclosureType {
    /// Map a source-reported type string to the canonical category.
    pub fn from_source(raw: &str) -> Self {
        let folded = raw.trim().to_lowercase();
        match folded.as_str() {
            "regulatory" | "regulatory final" => Self::Regulatory,
            "customer dispute" | "customer dispute - settled" | "customer complaint" => {
                Self::CustomerDispute
            }
            "criminal" | "criminal final disposition" => Self::Criminal,
            "civil" | "civil final" => Self::Civil,
            "judgment/lien" | "judgment / lien" | "judgment" => Self::Judgment,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Human-readable label used in alert descriptions.
    pub fn label(&self) -> &str {
        match self {
            Self::Regulatory => "regulatory",
            Self::CustomerDispute => "customer dispute",
            Self::Criminal => "criminal",
            Self::Civil => "civil",
            Self::Judgment => "judgment/lien",
            Self::Other(raw) => raw,
        }
    }
}

/// Canonical exam tags, recognized longest-pattern-first by the source
/// normalizer so "Series 7TO" never degrades to a partial "Series 7" hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamCategory {
    /// Securities Industry Essentials.
    Sie,
    /// General Securities Sales Supervisor.
    Series9_10,
    /// Series 7TO — Securities Trader qualification.
    Series7To,
    /// General Securities Representative.
    Series7,
    /// Investment Company Products Representative.
    Series6,
    /// General Securities Principal.
    Series24,
    /// Uniform Securities Agent State Law.
    Series63,
    /// Uniform Investment Adviser Law.
    Series65,
    /// Uniform Combined State Law.
    Series66,
    /// Investment Banking Representative.
    Series79,
    /// Private Securities Offerings Representative.
    Series82,
    /// Operations Professional.
    Series99,
}

/// A current employment entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employment {
    /// The employing firm's CRD, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firm_crd: Option<OrgCrd>,
    /// The employing firm's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firm_name: Option<String>,
    /// When the registration with this firm began.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_begin: Option<NaiveDate>,
    /// Branch offices the individual works from.
    #[serde(default)]
    pub branch_offices: Vec<BranchOffice>,
}

/// A branch-office location. All fields optional — sources omit freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchOffice {
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State or province code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_reports_empty() {
        let rec = IndividualRecord::empty(SourceTag::BrokerCheck);
        assert!(rec.is_empty());

        let mut named = rec.clone();
        named.fetched_name = "John Smith".into();
        assert!(!named.is_empty());
    }

    #[test]
    fn scope_activity_is_case_insensitive() {
        assert!(IndividualRecord::scope_is_active(Some("Active")));
        assert!(IndividualRecord::scope_is_active(Some("ACTIVE ")));
        assert!(!IndividualRecord::scope_is_active(Some("InActive")));
        assert!(!IndividualRecord::scope_is_active(None));
    }

    #[test]
    fn disclosure_type_maps_known_strings() {
        assert_eq!(
            DisclosureType::from_source("Customer Dispute"),
            DisclosureType::CustomerDispute
        );
        assert_eq!(
            DisclosureType::from_source("Regulatory Final"),
            DisclosureType::Regulatory
        );
        assert_eq!(
            DisclosureType::from_source("Bankruptcy"),
            DisclosureType::Other("Bankruptcy".into())
        );
    }
}
