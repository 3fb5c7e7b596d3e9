//! Fuzzy-filtered evaluation of disciplinary, arbitration, and regulatory
//! action records.
//!
//! Sources return every action whose reported name resembles the query at
//! all; without filtering, a common surname would attach unrelated
//! proceedings to the individual. Each record's associated names are scored
//! against the claim name and the record is kept only at or above the
//! threshold. Found-vs-filtered counts are retained per source so an
//! all-filtered result is still auditable.

use std::collections::BTreeMap;

use rdd_core::{
    ActionKind, ActionRecord, Alert, Category, DueDiligenceCounters, EvaluationSection, Severity,
    SourceTag,
};
use rdd_match::similarity;
use serde_json::json;

fn category_for(kind: ActionKind) -> Category {
    match kind {
        ActionKind::Disciplinary => Category::Disciplinary,
        ActionKind::Arbitration => Category::Arbitration,
        ActionKind::Regulatory => Category::Regulatory,
    }
}

fn action_description(action: &ActionRecord) -> String {
    let date = action
        .date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "undated".to_string());
    let case = if action.case_id.is_empty() {
        "unnumbered case".to_string()
    } else {
        format!("case {}", action.case_id)
    };
    format!(
        "{} ({case}, {date}): {}",
        action.kind.label(),
        action.description
    )
}

/// Filter one category's action list against the claim name and turn the
/// survivors into findings.
///
/// Every surviving record is stamped with its best name-match score and
/// becomes one High alert. The section detail always carries the
/// [`DueDiligenceCounters`], whether or not anything survived.
pub fn evaluate_actions(
    kind: ActionKind,
    expected_name: &str,
    actions: &[ActionRecord],
    threshold: f64,
) -> EvaluationSection {
    let category = category_for(kind);
    let mut counters = DueDiligenceCounters::default();
    let mut per_source: BTreeMap<SourceTag, (usize, usize)> = BTreeMap::new();
    let mut retained: Vec<ActionRecord> = Vec::new();

    for action in actions {
        let entry = per_source.entry(action.source).or_default();
        entry.0 += 1;

        let (primary, alternates) = match action.associated_names.split_first() {
            Some((first, rest)) => (first.as_str(), rest),
            None => ("", &[] as &[String]),
        };
        let (details, score) = similarity(expected_name, primary, alternates, threshold);
        match score {
            Some(score) => {
                let mut kept = action.clone();
                kept.name_match_score = Some(score);
                retained.push(kept);
            }
            None => {
                entry.1 += 1;
                tracing::debug!(
                    kind = kind.label(),
                    case_id = %action.case_id,
                    best = ?details.best_candidate,
                    "action filtered by name match"
                );
            }
        }
    }
    for (source, (found, filtered)) in per_source {
        counters.record(source, found, filtered);
    }

    let alerts: Vec<Alert> = retained
        .iter()
        .map(|action| {
            Alert::new(category, Severity::High, action_description(action)).with_metadata(json!({
                "source": action.source,
                "case_id": action.case_id,
                "date": action.date,
                "name_match_score": action.name_match_score,
                "documents": action.documents,
            }))
        })
        .collect();

    let (found, filtered) = (counters.records_found, counters.records_filtered);
    let detail = json!({
        "counters": counters,
        "retained": retained,
    });
    if alerts.is_empty() {
        EvaluationSection::compliant(format!(
            "no {} records attributable to the individual \
             ({found} found, {filtered} filtered by name)",
            kind.label(),
        ))
        .with_detail(detail)
    } else {
        EvaluationSection::non_compliant(
            format!(
                "{} {} record(s) attributable to the individual",
                alerts.len(),
                kind.label()
            ),
            alerts,
        )
        .with_detail(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdd_match::DEFAULT_FUZZY_THRESHOLD;

    fn action(names: &[&str], case_id: &str) -> ActionRecord {
        ActionRecord {
            source: SourceTag::FinraDisciplinary,
            kind: ActionKind::Disciplinary,
            case_id: case_id.into(),
            description: "censured and fined".into(),
            date: None,
            associated_names: names.iter().map(|n| n.to_string()).collect(),
            documents: Vec::new(),
            metadata: serde_json::Value::Null,
            name_match_score: None,
        }
    }

    #[test]
    fn matching_action_survives_and_carries_its_score() {
        let section = evaluate_actions(
            ActionKind::Disciplinary,
            "John Smith",
            &[action(&["John Smith"], "2019060001")],
            DEFAULT_FUZZY_THRESHOLD,
        );
        assert!(!section.compliant);
        assert_eq!(section.alerts.len(), 1);
        assert_eq!(section.alerts[0].severity, Severity::High);
        assert_eq!(section.alerts[0].metadata["name_match_score"], 100.0);
        assert_eq!(section.detail["counters"]["records_found"], 1);
        assert_eq!(section.detail["counters"]["records_filtered"], 0);
    }

    #[test]
    fn unrelated_same_surname_is_filtered_but_counted() {
        let section = evaluate_actions(
            ActionKind::Arbitration,
            "John Smith",
            &[action(&["Robert Henderson Smith Partners Corp"], "99-1234")],
            DEFAULT_FUZZY_THRESHOLD,
        );
        assert!(section.compliant);
        assert!(section.alerts.is_empty());
        assert_eq!(section.detail["counters"]["records_found"], 1);
        assert_eq!(section.detail["counters"]["records_filtered"], 1);
        assert!(section.explanation.contains("1 filtered"));
    }

    #[test]
    fn alias_names_are_tried_for_the_match() {
        let section = evaluate_actions(
            ActionKind::Regulatory,
            "John Smith",
            &[action(&["JS Capital LLC", "Smith, John"], "AP-3-12345")],
            DEFAULT_FUZZY_THRESHOLD,
        );
        assert!(!section.compliant);
        assert_eq!(section.alerts.len(), 1);
    }

    #[test]
    fn nameless_action_is_discarded() {
        let section = evaluate_actions(
            ActionKind::Disciplinary,
            "John Smith",
            &[action(&[], "2020010001")],
            DEFAULT_FUZZY_THRESHOLD,
        );
        assert!(section.compliant);
        assert_eq!(section.detail["counters"]["records_filtered"], 1);
    }

    #[test]
    fn empty_action_list_is_compliant_with_zero_counters() {
        let section = evaluate_actions(
            ActionKind::Arbitration,
            "John Smith",
            &[],
            DEFAULT_FUZZY_THRESHOLD,
        );
        assert!(section.compliant);
        assert_eq!(section.detail["counters"]["records_found"], 0);
    }
}
