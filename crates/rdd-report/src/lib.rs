//! # rdd-report — Report Assembly
//!
//! Assembles per-category [`EvaluationSection`]s into one
//! [`ComplianceReport`] in the fixed [`Category`] order and derives the
//! rollup: overall compliance is the AND of every section flag, risk level
//! is the maximum alert severity (Low when there are no alerts), and the
//! recommendation is a fixed two-branch string.
//!
//! Skip paths stay out of the compliance AND on purpose. A claim that was
//! never evaluated gets neutral-`true` sections everywhere; the search
//! section alone carries a failure signal, so "search failed" and
//! "evaluated non-compliant" remain distinguishable in the stored report.

use chrono::Utc;
use serde_json::json;

use rdd_core::{
    Alert, Category, Claim, ComplianceReport, EvaluationSection, FinalEvaluation, Severity,
};
use rdd_engine::skipped_section;
use rdd_search::SearchOutcome;

/// Recommendation text for a report whose every section passed.
pub const RECOMMEND_CLEAR: &str =
    "No further action required: all due-diligence checks passed.";
/// Recommendation text for a report with at least one failed section.
pub const RECOMMEND_REVIEW: &str =
    "Manual review required: one or more due-diligence checks did not pass.";

/// The nine per-category verdicts, named, in report order.
#[derive(Debug, Clone)]
pub struct Sections {
    pub search: EvaluationSection,
    pub registration_status: EvaluationSection,
    pub name_match: EvaluationSection,
    pub license: EvaluationSection,
    pub exams: EvaluationSection,
    pub disclosures: EvaluationSection,
    pub disciplinary: EvaluationSection,
    pub arbitration: EvaluationSection,
    pub regulatory: EvaluationSection,
}

impl Sections {
    /// Neutral-`true` sections for every category, each carrying a
    /// `DueDiligenceNotPerformed` alert naming the reason.
    pub fn skipped(reason: &str) -> Self {
        Self {
            search: skipped_section(Category::Search, reason),
            registration_status: skipped_section(Category::RegistrationStatus, reason),
            name_match: skipped_section(Category::NameMatch, reason),
            license: skipped_section(Category::License, reason),
            exams: skipped_section(Category::Exams, reason),
            disclosures: skipped_section(Category::Disclosures, reason),
            disciplinary: skipped_section(Category::Disciplinary, reason),
            arbitration: skipped_section(Category::Arbitration, reason),
            regulatory: skipped_section(Category::Regulatory, reason),
        }
    }

    /// A failed search followed by neutral skips everywhere downstream.
    pub fn search_failed(outcome: &SearchOutcome) -> Self {
        let reason = format!("search failed: {}", outcome.explanation);
        let mut sections = Self::skipped(&reason);
        sections.search = search_section(outcome);
        sections
    }
}

/// Turn a search outcome into the report's search section.
///
/// A failed search carries one High `IndividualNotFound` alert; the
/// section detail records the source, strategy label, and resolved CRD
/// either way.
pub fn search_section(outcome: &SearchOutcome) -> EvaluationSection {
    let detail = json!({
        "source": outcome.source,
        "search_strategy": outcome.strategy.as_str(),
        "crd": outcome.crd,
    });
    if outcome.compliant {
        EvaluationSection::compliant(outcome.explanation.clone()).with_detail(detail)
    } else {
        let alert = Alert::new(
            Category::Search,
            Severity::High,
            format!("IndividualNotFound: {}", outcome.explanation),
        );
        EvaluationSection::non_compliant(outcome.explanation.clone(), vec![alert])
            .with_detail(detail)
    }
}

/// Assemble the complete report for one claim run.
pub fn build_report(claim: Claim, sections: Sections) -> ComplianceReport {
    let Sections {
        search,
        registration_status,
        name_match,
        license,
        exams,
        disclosures,
        disciplinary,
        arbitration,
        regulatory,
    } = sections;

    let ordered = [
        &search,
        &registration_status,
        &name_match,
        &license,
        &exams,
        &disclosures,
        &disciplinary,
        &arbitration,
        &regulatory,
    ];
    let overall_compliance = ordered.iter().all(|s| s.compliant);
    let alerts: Vec<Alert> = ordered
        .iter()
        .flat_map(|s| s.alerts.iter().cloned())
        .collect();
    let risk_level = alerts
        .iter()
        .map(|a| a.severity)
        .max()
        .unwrap_or(Severity::Low);
    let recommendation = if overall_compliance {
        RECOMMEND_CLEAR
    } else {
        RECOMMEND_REVIEW
    };
    tracing::info!(
        reference_id = %claim.reference_id,
        overall_compliance,
        risk_level = ?risk_level,
        alert_count = alerts.len(),
        "report assembled"
    );

    ComplianceReport {
        reference_id: claim.reference_id.clone(),
        claim,
        search,
        registration_status,
        name_match,
        license,
        exams,
        disclosures,
        disciplinary,
        arbitration,
        regulatory,
        final_evaluation: FinalEvaluation {
            overall_compliance,
            risk_level,
            recommendation: recommendation.to_string(),
            alerts,
        },
        generated_at: Utc::now(),
    }
}

/// The full report for a claim that never reached the pipeline
/// (validation failure or missing identifiers).
pub fn skipped_report(claim: Claim, reason: &str) -> ComplianceReport {
    build_report(claim, Sections::skipped(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdd_core::{BatchId, ReferenceId, SourceTag};
    use rdd_search::SearchStrategy;

    fn claim() -> Claim {
        Claim {
            individual_name: Some("John Smith".into()),
            first_name: None,
            middle_name: None,
            last_name: None,
            suffix: None,
            crd: None,
            organization_crd: None,
            organization_name: None,
            license_type: None,
            reference_id: ReferenceId::new("R1").unwrap(),
            batch_id: BatchId::new("B1").unwrap(),
        }
    }

    fn clean_sections() -> Sections {
        let ok = || EvaluationSection::compliant("ok");
        Sections {
            search: ok(),
            registration_status: ok(),
            name_match: ok(),
            license: ok(),
            exams: ok(),
            disclosures: ok(),
            disciplinary: ok(),
            arbitration: ok(),
            regulatory: ok(),
        }
    }

    #[test]
    fn clean_report_is_compliant_low_risk() {
        let report = build_report(claim(), clean_sections());
        assert!(report.final_evaluation.overall_compliance);
        assert_eq!(report.final_evaluation.risk_level, Severity::Low);
        assert_eq!(report.final_evaluation.recommendation, RECOMMEND_CLEAR);
        assert!(report.final_evaluation.alerts.is_empty());
    }

    #[test]
    fn risk_level_is_the_max_alert_severity() {
        let mut sections = clean_sections();
        sections.name_match = EvaluationSection {
            compliant: true,
            explanation: "noted".into(),
            alerts: vec![Alert::new(Category::NameMatch, Severity::Low, "note")],
            detail: serde_json::Value::Null,
        };
        sections.disclosures = EvaluationSection::non_compliant(
            "1 disclosure",
            vec![Alert::new(Category::Disclosures, Severity::High, "event")],
        );
        let report = build_report(claim(), sections);
        assert!(!report.final_evaluation.overall_compliance);
        assert_eq!(report.final_evaluation.risk_level, Severity::High);
        assert_eq!(report.final_evaluation.recommendation, RECOMMEND_REVIEW);
        assert_eq!(report.final_evaluation.alerts.len(), 2);
    }

    #[test]
    fn skipped_report_is_neutral_true_with_alerts_everywhere() {
        let report = skipped_report(claim(), "claim carries no usable identifiers");
        assert!(report.final_evaluation.overall_compliance);
        assert_eq!(report.final_evaluation.risk_level, Severity::High);
        assert_eq!(report.final_evaluation.alerts.len(), 9);
        for (_, section) in report.sections() {
            assert!(section.compliant);
            assert!(section
                .explanation
                .contains("claim carries no usable identifiers"));
            assert_eq!(section.alerts.len(), 1);
        }
    }

    #[test]
    fn failed_search_carries_individual_not_found_and_fails_overall() {
        let outcome = SearchOutcome {
            source: SourceTag::SecIapd,
            strategy: SearchStrategy::SearchWithCrdOnly,
            crd: None,
            record: None,
            compliant: false,
            explanation: "no individual found for CRD 67890".into(),
        };
        let report = build_report(claim(), Sections::search_failed(&outcome));
        assert!(!report.final_evaluation.overall_compliance);
        assert!(!report.search.compliant);
        assert!(report.search.alerts[0]
            .description
            .starts_with("IndividualNotFound"));
        // Downstream sections are neutral, not failures.
        assert!(report.exams.compliant);
        assert!(report.exams.explanation.contains("search failed"));
    }

    #[test]
    fn search_section_detail_carries_the_strategy_label() {
        let outcome = SearchOutcome {
            source: SourceTag::BrokerCheck,
            strategy: SearchStrategy::SearchWithCorrelated,
            crd: None,
            record: None,
            compliant: true,
            explanation: "individual identified".into(),
        };
        let section = search_section(&outcome);
        assert!(section.compliant);
        assert_eq!(section.detail["search_strategy"], "search_with_correlated");
    }
}
