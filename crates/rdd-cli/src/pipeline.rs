//! # Per-Claim Pipeline
//!
//! The end-to-end path for one claim: validation, strategy execution,
//! action fetches, rule evaluation, and report assembly. Every attempted
//! claim yields a complete report; the one exception is the action
//! normalizer's shape-change tripwire, which aborts the claim so a silent
//! upstream format change cannot corrupt due-diligence counts.

use std::collections::BTreeMap;

use anyhow::{Context, Result};

use rdd_core::{ActionKind, ActionRecord, Claim, ComplianceReport};
use rdd_engine::{
    evaluate_actions, evaluate_disclosures, evaluate_exams, evaluate_license, evaluate_name,
    evaluate_registration_status, DEFAULT_FUZZY_THRESHOLD,
};
use rdd_report::{build_report, search_section, skipped_report, Sections};
use rdd_search::SearchContext;
use rdd_source::{normalize_actions, DataSource};

/// Everything one claim needs, threaded explicitly.
pub struct Pipeline {
    search: SearchContext,
    action_sources: Vec<(ActionKind, Box<dyn DataSource>)>,
    threshold: f64,
}

impl Pipeline {
    pub fn new(search: SearchContext) -> Self {
        Self {
            search,
            action_sources: Vec::new(),
            threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    /// Register a disciplinary/arbitration/regulatory action source.
    pub fn with_action_source(mut self, kind: ActionKind, source: Box<dyn DataSource>) -> Self {
        self.action_sources.push((kind, source));
        self
    }

    /// Override the fuzzy name-match threshold for action filtering.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Process one claim end to end.
    pub fn process(&mut self, claim: &Claim) -> Result<ComplianceReport> {
        if let Err(reason) = claim.validate() {
            tracing::info!(reference_id = %claim.reference_id, %reason, "claim skip-classified");
            return Ok(skipped_report(claim.clone(), &reason));
        }

        let outcome = self.search.execute(claim);
        if !outcome.compliant {
            return Ok(build_report(claim.clone(), Sections::search_failed(&outcome)));
        }
        let Some(record) = outcome.record.clone() else {
            return Ok(build_report(claim.clone(), Sections::search_failed(&outcome)));
        };

        let expected_name = claim
            .display_name()
            .unwrap_or_else(|| record.fetched_name.clone());
        let actions = self.fetch_actions(&expected_name)?;
        let action_list = |kind: ActionKind| -> &[ActionRecord] {
            actions.get(&kind).map(Vec::as_slice).unwrap_or(&[])
        };

        let sections = Sections {
            search: search_section(&outcome),
            registration_status: evaluate_registration_status(&record),
            name_match: evaluate_name(claim, &record),
            license: evaluate_license(claim, &record),
            exams: evaluate_exams(claim, &record),
            disclosures: evaluate_disclosures(&record),
            disciplinary: evaluate_actions(
                ActionKind::Disciplinary,
                &expected_name,
                action_list(ActionKind::Disciplinary),
                self.threshold,
            ),
            arbitration: evaluate_actions(
                ActionKind::Arbitration,
                &expected_name,
                action_list(ActionKind::Arbitration),
                self.threshold,
            ),
            regulatory: evaluate_actions(
                ActionKind::Regulatory,
                &expected_name,
                action_list(ActionKind::Regulatory),
                self.threshold,
            ),
        };
        Ok(build_report(claim.clone(), sections))
    }

    /// Query every registered action source by the individual's first and
    /// last name. Source outages degrade to empty lists with a warning;
    /// only the shape-change tripwire propagates.
    fn fetch_actions(
        &mut self,
        expected_name: &str,
    ) -> Result<BTreeMap<ActionKind, Vec<ActionRecord>>> {
        let mut tokens = expected_name.split_whitespace();
        let first = tokens.next().unwrap_or("");
        let last = tokens.last().unwrap_or("");

        let mut actions: BTreeMap<ActionKind, Vec<ActionRecord>> = BTreeMap::new();
        for (kind, source) in &mut self.action_sources {
            let tag = source.tag();
            let payload = match source.fetch_disciplinary(first, last) {
                Ok(Some(payload)) => payload,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(%tag, error = %err, "action source failed, proceeding without its records");
                    continue;
                }
            };
            let records = normalize_actions(*kind, tag, "disciplinary", &payload)
                .with_context(|| format!("normalizing {} records from {tag}", kind.label()))?;
            actions.entry(*kind).or_default().extend(records);
        }
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdd_core::{BatchId, CrdNumber, ReferenceId, SourceTag};
    use rdd_source::{MockSource, OrgDirectory};
    use rdd_store::{MemoryBlobStore, QueryCache};
    use serde_json::json;

    fn search_context(primary: MockSource) -> SearchContext {
        SearchContext::new(
            QueryCache::new(Box::new(MemoryBlobStore::new())),
            Box::new(primary),
            Box::new(MockSource::new(SourceTag::SecIapd)),
            OrgDirectory::empty(),
        )
    }

    fn claim(crd: &str) -> Claim {
        Claim {
            individual_name: Some("John Smith".into()),
            first_name: None,
            middle_name: None,
            last_name: None,
            suffix: None,
            crd: Some(CrdNumber::new(crd).unwrap()),
            organization_crd: None,
            organization_name: None,
            license_type: None,
            reference_id: ReferenceId::new("R1").unwrap(),
            batch_id: BatchId::new("B1").unwrap(),
        }
    }

    fn registry_hit(crd: &str) -> serde_json::Value {
        let content = json!({
            "currentEmployments": [{"firmId": 1, "firmName": "Example Securities"}]
        })
        .to_string();
        json!({
            "hits": {"total": 1, "hits": [{"_source": {
                "ind_source_id": crd,
                "ind_firstname": "John",
                "ind_lastname": "Smith",
                "ind_bc_scope": "Active",
                "ind_ia_scope": "Active",
                "content": content,
                "iacontent": content
            }}]}
        })
    }

    #[test]
    fn invalid_claim_yields_a_skipped_report_without_any_lookup() {
        let mut pipeline = Pipeline::new(search_context(MockSource::new(SourceTag::BrokerCheck)));
        let mut c = claim("67890");
        c.individual_name = None;
        c.crd = None;
        let report = pipeline.process(&c).unwrap();
        assert!(report.final_evaluation.overall_compliance);
        assert_eq!(report.final_evaluation.alerts.len(), 9);
        assert!(report.search.explanation.contains("skipped"));
    }

    #[test]
    fn found_individual_gets_all_sections_evaluated() {
        let primary =
            MockSource::new(SourceTag::BrokerCheck).respond("basic", "67890", registry_hit("67890"));
        let mut pipeline = Pipeline::new(search_context(primary));
        let report = pipeline.process(&claim("67890")).unwrap();
        assert!(report.search.compliant);
        assert!(report.registration_status.compliant);
        assert!(report.name_match.compliant);
        assert!(report.disclosures.compliant);
        // No action sources registered: zero counters, compliant.
        assert_eq!(report.disciplinary.detail["counters"]["records_found"], 0);
    }

    #[test]
    fn matching_disciplinary_record_fails_the_report() {
        let primary =
            MockSource::new(SourceTag::BrokerCheck).respond("basic", "67890", registry_hit("67890"));
        let disciplinary = MockSource::new(SourceTag::FinraDisciplinary).respond(
            "disciplinary",
            "John Smith",
            json!({"results": [{
                "caseId": "2019060001",
                "caseSummary": "censured and fined",
                "individualName": "John Smith",
            }]}),
        );
        let mut pipeline = Pipeline::new(search_context(primary))
            .with_action_source(ActionKind::Disciplinary, Box::new(disciplinary));
        let report = pipeline.process(&claim("67890")).unwrap();
        assert!(!report.final_evaluation.overall_compliance);
        assert!(!report.disciplinary.compliant);
        assert_eq!(report.disciplinary.alerts.len(), 1);
    }

    #[test]
    fn action_source_outage_degrades_to_no_records() {
        let primary =
            MockSource::new(SourceTag::BrokerCheck).respond("basic", "67890", registry_hit("67890"));
        let arbitration = MockSource::new(SourceTag::FinraArbitration).fail(
            "disciplinary",
            "John Smith",
            rdd_source::MockFailure::Unavailable,
        );
        let mut pipeline = Pipeline::new(search_context(primary))
            .with_action_source(ActionKind::Arbitration, Box::new(arbitration));
        let report = pipeline.process(&claim("67890")).unwrap();
        assert!(report.arbitration.compliant);
    }
}
