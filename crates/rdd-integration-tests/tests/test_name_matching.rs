//! Name-match symmetry and the fuzzy filter's threshold boundary, as
//! exercised by the rule engine.

use proptest::prelude::*;
use rdd_core::{ActionKind, ActionRecord, SourceTag};
use rdd_engine::evaluate_actions;
use rdd_match::{names_match, similarity};

fn action(name: &str) -> ActionRecord {
    ActionRecord {
        source: SourceTag::FinraDisciplinary,
        kind: ActionKind::Disciplinary,
        case_id: "2019060001".into(),
        description: "censured".into(),
        date: None,
        associated_names: vec![name.to_string()],
        documents: Vec::new(),
        metadata: serde_json::Value::Null,
        name_match_score: None,
    }
}

#[test]
fn token_transposition_and_middle_names_are_tolerated() {
    assert!(names_match("John Smith", "Smith John", &[]));
    assert!(names_match("John A Smith", "John B Smith", &[]));
    assert!(!names_match("John Smith", "Jon Smith", &[]));
}

/// The token rule scores 85: at a threshold of exactly 85 the record is
/// retained, one point above it is discarded.
#[test]
fn fuzzy_boundary_is_inclusive_at_the_threshold() {
    let (_, score) = similarity("John Smith", "John Q Smith", &[], 85.0);
    assert_eq!(score, Some(85.0));

    let (_, score) = similarity("John Smith", "John Q Smith", &[], 86.0);
    assert_eq!(score, None);

    let section = evaluate_actions(
        ActionKind::Disciplinary,
        "John Smith",
        &[action("John Q Smith")],
        85.0,
    );
    assert!(!section.compliant);

    let section = evaluate_actions(
        ActionKind::Disciplinary,
        "John Smith",
        &[action("John Q Smith")],
        86.0,
    );
    assert!(section.compliant);
    assert_eq!(section.detail["counters"]["records_filtered"], 1);
}

#[test]
fn empty_candidate_name_scores_zero_and_is_discarded() {
    let (details, score) = similarity("John Smith", "", &[], 0.0);
    assert_eq!(score, None);
    assert!(details.best_candidate.is_none());
}

proptest! {
    /// An identical name is an exact match (score 100) and survives any
    /// legal threshold.
    #[test]
    fn identical_names_survive_every_threshold(
        first in "[A-Za-z]{2,10}",
        last in "[A-Za-z]{2,10}",
        threshold in 0.0f64..=100.0,
    ) {
        let name = format!("{first} {last}");
        let (_, score) = similarity(&name, &name, &[], threshold);
        prop_assert_eq!(score, Some(100.0));
    }

    /// Transposing first and last tokens never breaks the exact-mode match.
    #[test]
    fn transposition_symmetry_holds(
        first in "[A-Za-z]{2,10}",
        last in "[A-Za-z]{2,10}",
    ) {
        let forward = format!("{first} {last}");
        let reversed = format!("{last} {first}");
        prop_assert!(names_match(&forward, &reversed, &[]));
    }
}
