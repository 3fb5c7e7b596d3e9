//! # Alerts, Sections, and the Compliance Report
//!
//! The report is the single user-visible artifact of a claim-processing
//! run. It is assembled once, persisted as an immutable versioned
//! snapshot, and never updated in place.
//!
//! ## Severity Ordering
//!
//! [`Severity`] derives `Ord` with `Low < Medium < High`; the report's
//! overall risk level is the maximum severity across all attached alerts.
//! `High` is absorbing under that maximum — a single High alert sets the
//! report's risk level regardless of how many Low alerts surround it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::claim::Claim;
use crate::identity::ReferenceId;

/// Alert severity. Ordering is load-bearing: risk aggregation takes the max.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational; no action expected.
    Low,
    /// Needs review.
    Medium,
    /// Blocks a clean due-diligence verdict.
    High,
}

/// The evaluation categories, in fixed report order.
///
/// Declaration order here IS the section order of the assembled report and
/// the field order of the version-diff tuple. Do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Search execution outcome.
    Search,
    /// Broker/adviser scope status.
    RegistrationStatus,
    /// Claimed-vs-fetched name agreement.
    NameMatch,
    /// Declared license type vs active scopes.
    License,
    /// Required exams per claimed role.
    Exams,
    /// Disclosure events on record.
    Disclosures,
    /// Disciplinary proceedings.
    Disciplinary,
    /// Arbitration awards.
    Arbitration,
    /// Regulatory/enforcement actions.
    Regulatory,
}

impl Category {
    /// All categories in report order.
    pub const ALL: [Category; 9] = [
        Category::Search,
        Category::RegistrationStatus,
        Category::NameMatch,
        Category::License,
        Category::Exams,
        Category::Disclosures,
        Category::Disciplinary,
        Category::Arbitration,
        Category::Regulatory,
    ];

    /// Stable label used in alert metadata and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::RegistrationStatus => "registration_status",
            Self::NameMatch => "name_match",
            Self::License => "license",
            Self::Exams => "exams",
            Self::Disclosures => "disclosures",
            Self::Disciplinary => "disciplinary",
            Self::Arbitration => "arbitration",
            Self::Regulatory => "regulatory",
        }
    }
}

/// An immutable finding attached to exactly one evaluation category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// The category the alert belongs to.
    pub category: Category,
    /// How serious the finding is.
    pub severity: Severity,
    /// Human-readable description of the finding.
    pub description: String,
    /// Structured detail for downstream consumers.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Alert {
    /// Convenience constructor with empty metadata.
    pub fn new(category: Category, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            description: description.into(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Attach structured metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// The standardized alert attached to every section when evaluation was
    /// never performed (search failure or claim skip).
    pub fn due_diligence_not_performed(category: Category, reason: &str) -> Self {
        Self::new(
            category,
            Severity::High,
            format!("DueDiligenceNotPerformed: {reason}"),
        )
    }
}

/// One category's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSection {
    /// Whether this category passed.
    pub compliant: bool,
    /// Why.
    pub explanation: String,
    /// Findings attached to this category.
    #[serde(default)]
    pub alerts: Vec<Alert>,
    /// Category-specific detail (match score, due-diligence counters, ...).
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl EvaluationSection {
    /// A compliant section with no alerts.
    pub fn compliant(explanation: impl Into<String>) -> Self {
        Self {
            compliant: true,
            explanation: explanation.into(),
            alerts: Vec::new(),
            detail: serde_json::Value::Null,
        }
    }

    /// A non-compliant section carrying the given alerts.
    pub fn non_compliant(explanation: impl Into<String>, alerts: Vec<Alert>) -> Self {
        Self {
            compliant: false,
            explanation: explanation.into(),
            alerts,
            detail: serde_json::Value::Null,
        }
    }

    /// Attach category-specific detail.
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }
}

/// The report-level rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalEvaluation {
    /// AND across all section compliance flags.
    pub overall_compliance: bool,
    /// Max severity across all attached alerts; `Low` when there are none.
    pub risk_level: Severity,
    /// Fixed two-branch recommendation text.
    pub recommendation: String,
    /// Every alert from every section, flattened in section order.
    pub alerts: Vec<Alert>,
}

/// The complete, versioned compliance report for one claim run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Stable key for the claim across runs; the versioning key.
    pub reference_id: ReferenceId,
    /// Snapshot of the claim as submitted.
    pub claim: Claim,
    /// Search execution outcome.
    pub search: EvaluationSection,
    /// Scope status verdict.
    pub registration_status: EvaluationSection,
    /// Name agreement verdict.
    pub name_match: EvaluationSection,
    /// License verdict.
    pub license: EvaluationSection,
    /// Exams verdict.
    pub exams: EvaluationSection,
    /// Disclosures verdict.
    pub disclosures: EvaluationSection,
    /// Disciplinary verdict.
    pub disciplinary: EvaluationSection,
    /// Arbitration verdict.
    pub arbitration: EvaluationSection,
    /// Regulatory-action verdict.
    pub regulatory: EvaluationSection,
    /// Report-level rollup.
    pub final_evaluation: FinalEvaluation,
    /// When the report was assembled. Excluded from version diffing.
    pub generated_at: DateTime<Utc>,
}

impl ComplianceReport {
    /// The sections in fixed report order, paired with their category.
    pub fn sections(&self) -> [(Category, &EvaluationSection); 9] {
        [
            (Category::Search, &self.search),
            (Category::RegistrationStatus, &self.registration_status),
            (Category::NameMatch, &self.name_match),
            (Category::License, &self.license),
            (Category::Exams, &self.exams),
            (Category::Disclosures, &self.disclosures),
            (Category::Disciplinary, &self.disciplinary),
            (Category::Arbitration, &self.arbitration),
            (Category::Regulatory, &self.regulatory),
        ]
    }

    /// The fields the report store diffs before writing a new version.
    ///
    /// Timestamps and free text are deliberately excluded: a re-run against
    /// unchanged upstream data must compare equal.
    pub fn tracked_fields(&self) -> TrackedFields {
        TrackedFields {
            overall_compliance: self.final_evaluation.overall_compliance,
            section_compliance: self.sections().map(|(_, s)| s.compliant),
            alert_count: self.final_evaluation.alerts.len(),
        }
    }
}

/// The version-diff tuple: a new snapshot is written only when this differs
/// from the newest stored snapshot's tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFields {
    /// Overall compliance flag.
    pub overall_compliance: bool,
    /// Per-section compliance flags, in [`Category::ALL`] order.
    pub section_compliance: [bool; 9],
    /// Total alert count.
    pub alert_count: usize,
}
