//! Strategy selection and fallback order, driven through the full search
//! context rather than the decision table alone.

use rdd_core::{BatchId, Claim, CrdNumber, OrgCrd, ReferenceId, SourceTag};
use rdd_search::{SearchContext, SearchStrategy};
use rdd_source::{MockSource, OrgDirectory};
use rdd_store::{MemoryBlobStore, QueryCache};
use serde_json::json;

fn claim(name: Option<&str>, crd: Option<&str>, org_crd: Option<&str>) -> Claim {
    Claim {
        individual_name: name.map(str::to_string),
        first_name: None,
        middle_name: None,
        last_name: None,
        suffix: None,
        crd: crd.map(|c| CrdNumber::new(c).unwrap()),
        organization_crd: org_crd.map(|o| OrgCrd::new(o).unwrap()),
        organization_name: None,
        license_type: None,
        reference_id: ReferenceId::new("R1").unwrap(),
        batch_id: BatchId::new("B1").unwrap(),
    }
}

fn registry_hit(crd: &str) -> serde_json::Value {
    let content = json!({
        "currentEmployments": [{"firmId": 282563, "firmName": "Example Securities LLC"}]
    })
    .to_string();
    json!({
        "hits": {"total": 1, "hits": [{"_source": {
            "ind_source_id": crd,
            "ind_firstname": "John",
            "ind_lastname": "Smith",
            "ind_bc_scope": "Active",
            "content": content
        }}]}
    })
}

fn context(primary: MockSource, alternate: MockSource) -> SearchContext {
    SearchContext::new(
        QueryCache::new(Box::new(MemoryBlobStore::new())),
        Box::new(primary),
        Box::new(alternate),
        OrgDirectory::empty(),
    )
}

/// With a CRD, an org CRD, AND a name all present, the direct-id path
/// must win over any correlated-name path. Only the `basic` operation is
/// scripted, so a correlated lookup would come back empty-handed.
#[test]
fn direct_id_beats_correlation_when_both_are_possible() {
    let primary =
        MockSource::new(SourceTag::BrokerCheck).respond("basic", "67890", registry_hit("67890"));
    let mut ctx = context(primary, MockSource::new(SourceTag::SecIapd));

    let outcome = ctx.execute(&claim(Some("John Smith"), Some("67890"), Some("282563")));
    assert!(outcome.compliant);
    assert_eq!(outcome.strategy, SearchStrategy::SearchWithCrdAndOrg);
    assert_eq!(outcome.source, SourceTag::BrokerCheck);
}

/// When the direct lookup misses, the same claim recovers through
/// name/org correlation at the alternate registry, keeping the
/// direct-id strategy label.
#[test]
fn direct_id_miss_recovers_through_correlation() {
    let alternate = MockSource::new(SourceTag::SecIapd).respond(
        "name_org",
        "John Smith|282563",
        registry_hit("67890"),
    );
    let mut ctx = context(MockSource::new(SourceTag::BrokerCheck), alternate);

    let outcome = ctx.execute(&claim(Some("John Smith"), Some("67890"), Some("282563")));
    assert!(outcome.compliant);
    assert_eq!(outcome.strategy, SearchStrategy::SearchWithCrdAndOrg);
    assert_eq!(outcome.source, SourceTag::SecIapd);
}

#[test]
fn org_identifiers_alone_are_terminal() {
    let mut ctx = context(
        MockSource::new(SourceTag::BrokerCheck),
        MockSource::new(SourceTag::SecIapd),
    );
    let outcome = ctx.execute(&claim(None, None, Some("282563")));
    assert_eq!(outcome.strategy, SearchStrategy::SearchWithOrgOnly);
    assert!(!outcome.compliant);
    assert!(outcome.explanation.contains("not supported"));
}

#[test]
fn name_alone_is_terminal() {
    let mut ctx = context(
        MockSource::new(SourceTag::BrokerCheck),
        MockSource::new(SourceTag::SecIapd),
    );
    let outcome = ctx.execute(&claim(Some("John Smith"), None, None));
    assert_eq!(outcome.strategy, SearchStrategy::NameOnlyFallback);
    assert!(!outcome.compliant);
}
