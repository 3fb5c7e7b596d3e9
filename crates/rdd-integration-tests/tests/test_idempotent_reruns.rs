//! Re-running a claim against unchanged upstream data must be a store
//! no-op: the second run is served from the query cache, produces a
//! report with identical tracked fields, and writes no new snapshot.

use rdd_cli::pipeline::Pipeline;
use rdd_core::{BatchId, Claim, CrdNumber, ReferenceId};
use rdd_core::SourceTag;
use rdd_search::SearchContext;
use rdd_source::{MockSource, OrgDirectory};
use rdd_store::{LocalBlobStore, QueryCache, ReportStore, SaveOutcome};
use serde_json::json;

fn claim() -> Claim {
    Claim {
        individual_name: Some("John Smith".into()),
        first_name: None,
        middle_name: None,
        last_name: None,
        suffix: None,
        crd: Some(CrdNumber::new("67890").unwrap()),
        organization_crd: None,
        organization_name: None,
        license_type: None,
        reference_id: ReferenceId::new("E100").unwrap(),
        batch_id: BatchId::new("B1").unwrap(),
    }
}

fn registry_hit() -> serde_json::Value {
    let content = json!({
        "currentEmployments": [{"firmId": 282563, "firmName": "Example Securities LLC"}],
        "examsCategory": [{"examCategory": "Series 7"}],
        "stateExamCategory": [{"examCategory": "Series 66"}],
    })
    .to_string();
    json!({
        "hits": {"total": 1, "hits": [{"_source": {
            "ind_source_id": "67890",
            "ind_firstname": "John",
            "ind_lastname": "Smith",
            "ind_bc_scope": "Active",
            "ind_ia_scope": "NotInScope",
            "content": content
        }}]}
    })
}

fn pipeline_over(dir: &std::path::Path, primary: MockSource) -> Pipeline {
    Pipeline::new(SearchContext::new(
        QueryCache::new(Box::new(LocalBlobStore::new(dir))),
        Box::new(primary),
        Box::new(MockSource::new(SourceTag::SecIapd)),
        OrgDirectory::empty(),
    ))
}

#[test]
fn unchanged_rerun_writes_no_new_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = ReportStore::new(Box::new(LocalBlobStore::new(dir.path())));
    let batch_id = BatchId::new("B1").unwrap();
    let claim = claim();

    let primary =
        MockSource::new(SourceTag::BrokerCheck).respond("basic", "67890", registry_hit());
    let mut pipeline = pipeline_over(dir.path(), primary);
    let first = pipeline.process(&claim).unwrap();
    assert!(matches!(
        store.save(&batch_id, &first).unwrap(),
        SaveOutcome::Written { version: 1 }
    ));

    // Fresh pipeline, nothing scripted: the cache must carry the rerun.
    let mut pipeline = pipeline_over(dir.path(), MockSource::new(SourceTag::BrokerCheck));
    let second = pipeline.process(&claim).unwrap();
    assert_eq!(first.tracked_fields(), second.tracked_fields());
    assert_eq!(first.search.explanation, second.search.explanation);
    assert_eq!(
        first.final_evaluation.recommendation,
        second.final_evaluation.recommendation
    );

    assert!(matches!(
        store.save(&batch_id, &second).unwrap(),
        SaveOutcome::Unchanged { version: 1 }
    ));
}

#[test]
fn changed_outcome_writes_a_new_version() {
    let dir = tempfile::tempdir().unwrap();
    let store = ReportStore::new(Box::new(LocalBlobStore::new(dir.path())));
    let batch_id = BatchId::new("B1").unwrap();
    let claim = claim();

    // First run: registry silent, search fails.
    let mut pipeline = pipeline_over(dir.path(), MockSource::new(SourceTag::BrokerCheck));
    let failed = pipeline.process(&claim).unwrap();
    assert!(!failed.final_evaluation.overall_compliance);
    assert!(matches!(
        store.save(&batch_id, &failed).unwrap(),
        SaveOutcome::Written { version: 1 }
    ));

    // Second run in a fresh cache: the individual now appears.
    let cache_dir = tempfile::tempdir().unwrap();
    let primary =
        MockSource::new(SourceTag::BrokerCheck).respond("basic", "67890", registry_hit());
    let mut pipeline = pipeline_over(cache_dir.path(), primary);
    let found = pipeline.process(&claim).unwrap();
    assert!(found.final_evaluation.overall_compliance);
    assert!(matches!(
        store.save(&batch_id, &found).unwrap(),
        SaveOutcome::Written { version: 2 }
    ));
}
