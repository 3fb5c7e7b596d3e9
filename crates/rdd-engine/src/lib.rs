//! # rdd-engine — Rule Evaluation
//!
//! Pure per-category evaluators. Each takes the canonical record (or the
//! relevant claim slice) and returns one [`EvaluationSection`]; none of
//! them perform I/O or mutate their inputs, so every rule is unit-testable
//! in isolation.
//!
//! ## Key Design Principles
//!
//! - A section is `compliant=false` only when its category was actually
//!   evaluated and failed. Categories that were never evaluated (search
//!   failure, skip-classified claim) stay neutral-`true` and carry a
//!   `DueDiligenceNotPerformed` alert instead, so report consumers can
//!   tell "evaluated and clean" apart from "never looked".
//! - Disciplinary, arbitration, and regulatory hits are filtered through
//!   the fuzzy name matcher before they count against the individual;
//!   found-vs-filtered counters are retained in the section detail even
//!   when everything is filtered out.

pub mod actions;
pub mod individual;

use rdd_core::{Alert, Category, EvaluationSection};

pub use actions::evaluate_actions;
pub use individual::{
    evaluate_disclosures, evaluate_exams, evaluate_license, evaluate_name,
    evaluate_registration_status,
};
pub use rdd_match::DEFAULT_FUZZY_THRESHOLD;

/// The standardized section for a category that was never evaluated.
///
/// Neutral-`true` so the skip does not mask the search-failure signal,
/// which the search section alone carries; the attached High alert is what
/// tells consumers no due diligence happened here.
pub fn skipped_section(category: Category, reason: &str) -> EvaluationSection {
    EvaluationSection {
        compliant: true,
        explanation: format!("skipped: {reason}"),
        alerts: vec![Alert::due_diligence_not_performed(category, reason)],
        detail: serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdd_core::Severity;

    #[test]
    fn skipped_section_is_neutral_true_with_one_high_alert() {
        let section = skipped_section(Category::Exams, "individual not found");
        assert!(section.compliant);
        assert_eq!(section.explanation, "skipped: individual not found");
        assert_eq!(section.alerts.len(), 1);
        assert_eq!(section.alerts[0].severity, Severity::High);
        assert!(section.alerts[0]
            .description
            .contains("DueDiligenceNotPerformed"));
    }
}
