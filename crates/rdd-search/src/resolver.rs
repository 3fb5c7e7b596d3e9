//! # Strategy Execution
//!
//! Runs the selected strategy against the cache layer and the two
//! registries. Execution never propagates an error to the caller: every
//! path — hits, misses, rate limits, outages, malformed payloads — ends
//! in a [`SearchOutcome`], with failure text embedded in the explanation.
//!
//! ## Fallback Rules
//!
//! - CRD + org: direct lookup at the primary registry; on miss, retry by
//!   name/org correlation at the alternate registry (when a name exists).
//! - CRD only: a primary hit without employment data does not count as an
//!   identification; the alternate registry is consulted before anything
//!   is declared.
//! - Name + org: the org name must resolve through the directory by exact
//!   normalized match; an unresolved name is terminal — no lookups.
//!
//! A rate-limit response aborts only the current source call; whatever
//! fallback remains still runs. A fixed delay is slept after every live
//! (non-cached) upstream call to respect upstream rate limits.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use rdd_core::{BatchId, Claim, CrdNumber, IndividualRecord, OrgCrd, SourceError, SourceTag};
use rdd_source::{normalize_individual, DataSource, OrgDirectory};
use rdd_store::{CacheKey, QueryCache};

use crate::strategy::{resolve_strategy, SearchStrategy};

/// What a strategy execution produced.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// The registry whose answer (or final silence) this outcome reflects.
    pub source: SourceTag,
    /// The strategy that was selected for the claim.
    pub strategy: SearchStrategy,
    /// The resolved individual CRD, when one was found.
    pub crd: Option<CrdNumber>,
    /// The canonical record, when an individual was identified.
    pub record: Option<IndividualRecord>,
    /// Whether the search itself succeeded.
    pub compliant: bool,
    /// Why.
    pub explanation: String,
}

/// Which of the two injected registries a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Which {
    Primary,
    Alternate,
}

/// One upstream fetch, carrying its cache identity.
enum FetchOp<'a> {
    Basic(&'a CrdNumber),
    Detailed(&'a CrdNumber),
    NameOrg(&'a str, &'a OrgCrd),
}

impl FetchOp<'_> {
    fn operation(&self) -> &'static str {
        match self {
            Self::Basic(_) => "basic",
            Self::Detailed(_) => "detailed",
            Self::NameOrg(..) => "name_org",
        }
    }

    fn query_id(&self) -> String {
        match self {
            Self::Basic(crd) | Self::Detailed(crd) => crd.as_str().to_string(),
            Self::NameOrg(name, org) => format!("{name}|{org}"),
        }
    }
}

/// Everything strategy execution needs, threaded explicitly — no globals.
pub struct SearchContext {
    cache: QueryCache,
    primary: Box<dyn DataSource>,
    alternate: Box<dyn DataSource>,
    orgs: OrgDirectory,
    rate_limit_delay: Duration,
}

impl SearchContext {
    /// Build a context over the primary registry (BrokerCheck), the
    /// alternate registry (IAPD), and the organization directory.
    pub fn new(
        cache: QueryCache,
        primary: Box<dyn DataSource>,
        alternate: Box<dyn DataSource>,
        orgs: OrgDirectory,
    ) -> Self {
        Self {
            cache,
            primary,
            alternate,
            orgs,
            rate_limit_delay: Duration::ZERO,
        }
    }

    /// Set the fixed delay slept after each live upstream call.
    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    fn tag(&self, which: Which) -> SourceTag {
        match which {
            Which::Primary => self.primary.tag(),
            Which::Alternate => self.alternate.tag(),
        }
    }

    /// Execute the claim's strategy end to end.
    pub fn execute(&mut self, claim: &Claim) -> SearchOutcome {
        let strategy = resolve_strategy(&claim.features());
        tracing::debug!(
            reference_id = %claim.reference_id,
            %strategy,
            "strategy selected"
        );
        match strategy {
            SearchStrategy::SearchWithCrdAndOrg => self.run_crd_with_org(claim),
            SearchStrategy::SearchWithCrdOnly => self.run_crd_only(claim),
            SearchStrategy::SearchWithCorrelated => self.run_correlated(claim),
            SearchStrategy::SearchWithOrgOnly => self.terminal(
                strategy,
                "entity search is not supported: the claim carries organization \
                 identifiers only",
            ),
            SearchStrategy::NameOnlyFallback => self.terminal(
                strategy,
                "name-only search is not supported without an organization identifier",
            ),
            SearchStrategy::NoSearch => self.terminal(
                strategy,
                "insufficient identifiers: the claim carries neither an individual \
                 CRD nor a name with organization information",
            ),
        }
    }

    fn terminal(&self, strategy: SearchStrategy, explanation: &str) -> SearchOutcome {
        SearchOutcome {
            source: self.primary.tag(),
            strategy,
            crd: None,
            record: None,
            compliant: false,
            explanation: explanation.to_string(),
        }
    }

    // -- strategy paths ----------------------------------------------------

    fn run_crd_with_org(&mut self, claim: &Claim) -> SearchOutcome {
        let strategy = SearchStrategy::SearchWithCrdAndOrg;
        let Some(crd) = claim.crd.clone() else {
            return self.terminal(strategy, "claim lost its CRD between selection and execution");
        };
        let mut notes = Vec::new();

        match self.registry_record(Which::Primary, &crd, &claim.batch_id) {
            Ok(record) if !record.is_empty() => {
                return self.found(strategy, Which::Primary, record);
            }
            Ok(_) => notes.push(format!(
                "{}: no individual found for CRD {crd}",
                self.tag(Which::Primary)
            )),
            Err(note) => notes.push(note),
        }

        // Direct lookup missed; correlate by name at the alternate source.
        if let (Some(name), Some(org)) = (claim.display_name(), claim.organization_crd.clone()) {
            match self.correlated_record(Which::Alternate, &name, &org, &claim.batch_id) {
                Ok(Some(record)) => return self.found(strategy, Which::Alternate, record),
                Ok(None) => notes.push(format!(
                    "{}: no individual found by name/org correlation",
                    self.tag(Which::Alternate)
                )),
                Err(note) => notes.push(note),
            }
        }

        SearchOutcome {
            source: self.tag(Which::Alternate),
            strategy,
            crd: Some(crd.clone()),
            record: None,
            compliant: false,
            explanation: format!("no individual found for CRD {crd}: {}", notes.join("; ")),
        }
    }

    fn run_crd_only(&mut self, claim: &Claim) -> SearchOutcome {
        let strategy = SearchStrategy::SearchWithCrdOnly;
        let Some(crd) = claim.crd.clone() else {
            return self.terminal(strategy, "claim lost its CRD between selection and execution");
        };
        let mut notes = Vec::new();

        match self.registry_record(Which::Primary, &crd, &claim.batch_id) {
            Ok(record) if !record.is_empty() && !record.employments.is_empty() => {
                return self.found(strategy, Which::Primary, record);
            }
            Ok(record) if !record.is_empty() => {
                // A hit without employment data does not identify a currently
                // registered individual; consult the alternate registry.
                notes.push(format!(
                    "{}: hit for CRD {crd} carries no employment data",
                    self.tag(Which::Primary)
                ));
            }
            Ok(_) => notes.push(format!(
                "{}: no individual found for CRD {crd}",
                self.tag(Which::Primary)
            )),
            Err(note) => notes.push(note),
        }

        match self.registry_record(Which::Alternate, &crd, &claim.batch_id) {
            Ok(record) if !record.is_empty() => {
                return self.found(strategy, Which::Alternate, record);
            }
            Ok(_) => notes.push(format!(
                "{}: no individual found for CRD {crd}",
                self.tag(Which::Alternate)
            )),
            Err(note) => notes.push(note),
        }

        SearchOutcome {
            source: self.tag(Which::Alternate),
            strategy,
            crd: Some(crd.clone()),
            record: None,
            compliant: false,
            explanation: format!("no individual found for CRD {crd}: {}", notes.join("; ")),
        }
    }

    fn run_correlated(&mut self, claim: &Claim) -> SearchOutcome {
        let strategy = SearchStrategy::SearchWithCorrelated;
        let Some(name) = claim.display_name() else {
            return self.terminal(strategy, "claim lost its name between selection and execution");
        };

        let org = match claim.organization_crd.clone() {
            Some(org) => org,
            None => {
                let Some(org_name) = claim.organization_name.as_deref() else {
                    return self.terminal(strategy, "claim carries no organization information");
                };
                match self.orgs.resolve(org_name) {
                    Some(org) => org.clone(),
                    None => {
                        // Terminal by design: guessing at firms would
                        // correlate the individual against the wrong employer.
                        return self.terminal(
                            strategy,
                            &format!(
                                "organization {org_name:?} could not be resolved to a CRD; \
                                 no lookup attempted"
                            ),
                        );
                    }
                }
            }
        };

        let mut notes = Vec::new();
        for which in [Which::Primary, Which::Alternate] {
            match self.correlated_record(which, &name, &org, &claim.batch_id) {
                Ok(Some(record)) => return self.found(strategy, which, record),
                Ok(None) => notes.push(format!(
                    "{}: no individual found by name/org correlation",
                    self.tag(which)
                )),
                Err(note) => notes.push(note),
            }
        }

        SearchOutcome {
            source: self.tag(Which::Alternate),
            strategy,
            crd: None,
            record: None,
            compliant: false,
            explanation: format!(
                "no individual found for {name:?} at organization CRD {org}: {}",
                notes.join("; ")
            ),
        }
    }

    fn found(&self, strategy: SearchStrategy, which: Which, record: IndividualRecord) -> SearchOutcome {
        SearchOutcome {
            source: self.tag(which),
            strategy,
            crd: record.crd.clone(),
            compliant: true,
            explanation: format!(
                "individual identified at {} via {strategy}",
                self.tag(which)
            ),
            record: Some(record),
        }
    }

    // -- registry access ---------------------------------------------------

    /// Direct CRD lookup: basic payload, then the detailed document, then
    /// normalization. Failures come back as a note string — the path
    /// decides whether a fallback remains.
    fn registry_record(
        &mut self,
        which: Which,
        crd: &CrdNumber,
        batch_id: &BatchId,
    ) -> Result<IndividualRecord, String> {
        let tag = self.tag(which);
        let basic = match self.lookup(which, FetchOp::Basic(crd), batch_id) {
            Ok(Some(payload)) => payload,
            Ok(None) => return Ok(IndividualRecord::empty(tag)),
            Err(err) => return Err(err.to_string()),
        };
        // A detailed-fetch failure degrades to the basic record alone.
        let detailed = match self.lookup(which, FetchOp::Detailed(crd), batch_id) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(%tag, %crd, error = %err, "detailed fetch failed, continuing with basic record");
                None
            }
        };
        normalize_individual(tag, &basic, detailed.as_ref()).map_err(|err| err.to_string())
    }

    /// Name/org correlation at one registry, enriched with the detailed
    /// document when the hit carries a CRD.
    fn correlated_record(
        &mut self,
        which: Which,
        name: &str,
        org: &OrgCrd,
        batch_id: &BatchId,
    ) -> Result<Option<IndividualRecord>, String> {
        let tag = self.tag(which);
        let payload = match self.lookup(which, FetchOp::NameOrg(name, org), batch_id) {
            Ok(Some(payload)) => payload,
            Ok(None) => return Ok(None),
            Err(err) => return Err(err.to_string()),
        };
        let record = normalize_individual(tag, &payload, None).map_err(|err| err.to_string())?;
        if record.is_empty() {
            return Ok(None);
        }
        let Some(crd) = record.crd.clone() else {
            return Ok(Some(record));
        };
        match self.lookup(which, FetchOp::Detailed(&crd), batch_id) {
            Ok(Some(detailed)) => normalize_individual(tag, &payload, Some(&detailed))
                .map(Some)
                .map_err(|err| err.to_string()),
            Ok(None) => Ok(Some(record)),
            Err(err) => {
                tracing::warn!(%tag, %crd, error = %err, "detailed fetch failed, continuing with correlated record");
                Ok(Some(record))
            }
        }
    }

    /// Cache-first fetch. Only live calls pay the rate-limit delay; cache
    /// read/write failures degrade to live behavior with a warning.
    fn lookup(
        &mut self,
        which: Which,
        op: FetchOp<'_>,
        batch_id: &BatchId,
    ) -> Result<Option<Value>, SourceError> {
        let key = CacheKey {
            source: self.tag(which),
            operation: op.operation().to_string(),
            query_id: op.query_id(),
            batch_id: batch_id.clone(),
        };
        match self.cache.get(&key) {
            Ok(Some(payload)) => {
                tracing::debug!(source = %key.source, operation = %key.operation, "cache hit");
                return Ok(Some(payload));
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "cache read failed, falling through to live call");
            }
        }

        let source = match which {
            Which::Primary => self.primary.as_mut(),
            Which::Alternate => self.alternate.as_mut(),
        };
        let result = match op {
            FetchOp::Basic(crd) => source.fetch_basic(crd),
            FetchOp::Detailed(crd) => source.fetch_detailed(crd),
            FetchOp::NameOrg(name, org) => source.fetch_by_name_and_org(name, org),
        };
        if !self.rate_limit_delay.is_zero() {
            std::thread::sleep(self.rate_limit_delay);
        }

        if let Ok(Some(payload)) = &result {
            if let Err(err) = self.cache.put(&key, payload) {
                tracing::warn!(error = %err, "cache write failed, continuing uncached");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdd_source::{MockFailure, MockSource};
    use rdd_store::MemoryBlobStore;
    use serde_json::json;

    fn basic_hit(crd: &str, name: &str, with_employment: bool) -> Value {
        let employments: Vec<Value> = if with_employment {
            vec![json!({"firmId": 282563, "firmName": "Example Securities LLC"})]
        } else {
            Vec::new()
        };
        let content = json!({"currentEmployments": employments}).to_string();
        json!({
            "hits": {"total": 1, "hits": [{"_source": {
                "ind_source_id": crd,
                "ind_firstname": name.split(' ').next().unwrap_or(""),
                "ind_lastname": name.split(' ').nth(1).unwrap_or(""),
                "ind_bc_scope": "Active",
                "ind_ia_scope": "InActive",
                "content": content,
                "iacontent": content
            }}]}
        })
    }

    fn claim(crd: Option<&str>, name: Option<&str>, org_crd: Option<&str>) -> Claim {
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
            reference_id: rdd_core::ReferenceId::new("R1").unwrap(),
            batch_id: BatchId::new("B1").unwrap(),
        }
    }

    fn context(primary: MockSource, alternate: MockSource) -> SearchContext {
        SearchContext::new(
            QueryCache::new(Box::new(MemoryBlobStore::new())),
            Box::new(primary),
            Box::new(alternate),
            OrgDirectory::empty(),
        )
    }

    #[test]
    fn direct_hit_with_employment_is_compliant() {
        let primary = MockSource::new(SourceTag::BrokerCheck).respond(
            "basic",
            "67890",
            basic_hit("67890", "John Smith", true),
        );
        let mut ctx = context(primary, MockSource::new(SourceTag::SecIapd));
        let outcome = ctx.execute(&claim(Some("67890"), None, None));
        assert!(outcome.compliant);
        assert_eq!(outcome.source, SourceTag::BrokerCheck);
        assert_eq!(outcome.strategy, SearchStrategy::SearchWithCrdOnly);
        assert_eq!(outcome.crd.unwrap().as_str(), "67890");
    }

    /// A hit with no employments falls back to the alternate registry; if
    /// that also misses, the search is non-compliant with the alternate's
    /// tag.
    #[test]
    fn employmentless_hit_falls_back_and_both_missing_is_non_compliant() {
        let primary = MockSource::new(SourceTag::BrokerCheck).respond(
            "basic",
            "67890",
            basic_hit("67890", "John Smith", false),
        );
        let mut ctx = context(primary, MockSource::new(SourceTag::SecIapd));
        let outcome = ctx.execute(&claim(Some("67890"), None, None));
        assert!(!outcome.compliant);
        assert_eq!(outcome.source, SourceTag::SecIapd);
        assert!(outcome.explanation.contains("no individual found"));
    }

    #[test]
    fn employmentless_hit_recovers_via_alternate_registry() {
        let primary = MockSource::new(SourceTag::BrokerCheck).respond(
            "basic",
            "67890",
            basic_hit("67890", "John Smith", false),
        );
        let alternate = MockSource::new(SourceTag::SecIapd).respond(
            "basic",
            "67890",
            basic_hit("67890", "John Smith", true),
        );
        let mut ctx = context(primary, alternate);
        let outcome = ctx.execute(&claim(Some("67890"), None, None));
        assert!(outcome.compliant);
        assert_eq!(outcome.source, SourceTag::SecIapd);
    }

    /// Name + org CRD correlates, strategy label preserved.
    #[test]
    fn correlated_search_reports_the_correlated_label() {
        let primary = MockSource::new(SourceTag::BrokerCheck).respond(
            "name_org",
            "Matthew Vetto|282563",
            basic_hit("2216269", "Matthew Vetto", true),
        );
        let mut ctx = context(primary, MockSource::new(SourceTag::SecIapd));
        let outcome = ctx.execute(&claim(None, Some("Matthew Vetto"), Some("282563")));
        assert!(outcome.compliant);
        assert_eq!(outcome.strategy, SearchStrategy::SearchWithCorrelated);
        assert_eq!(outcome.source, SourceTag::BrokerCheck);
        assert_eq!(outcome.crd.unwrap().as_str(), "2216269");
    }

    #[test]
    fn crd_and_org_misses_direct_then_correlates_at_alternate() {
        let alternate = MockSource::new(SourceTag::SecIapd).respond(
            "name_org",
            "John Smith|282563",
            basic_hit("67890", "John Smith", true),
        );
        let mut ctx = context(MockSource::new(SourceTag::BrokerCheck), alternate);
        let outcome = ctx.execute(&claim(Some("67890"), Some("John Smith"), Some("282563")));
        assert!(outcome.compliant);
        assert_eq!(outcome.strategy, SearchStrategy::SearchWithCrdAndOrg);
        assert_eq!(outcome.source, SourceTag::SecIapd);
    }

    #[test]
    fn rate_limit_aborts_the_call_but_not_the_fallback() {
        let primary = MockSource::new(SourceTag::BrokerCheck).fail(
            "basic",
            "67890",
            MockFailure::RateLimited,
        );
        let alternate = MockSource::new(SourceTag::SecIapd).respond(
            "basic",
            "67890",
            basic_hit("67890", "John Smith", true),
        );
        let mut ctx = context(primary, alternate);
        let outcome = ctx.execute(&claim(Some("67890"), None, None));
        assert!(outcome.compliant);
        assert_eq!(outcome.source, SourceTag::SecIapd);
    }

    #[test]
    fn outage_text_is_embedded_in_the_explanation() {
        let primary = MockSource::new(SourceTag::BrokerCheck).fail(
            "basic",
            "67890",
            MockFailure::Unavailable,
        );
        let mut ctx = context(primary, MockSource::new(SourceTag::SecIapd));
        let outcome = ctx.execute(&claim(Some("67890"), None, None));
        assert!(!outcome.compliant);
        assert!(outcome.explanation.contains("unavailable"));
    }

    #[test]
    fn unresolved_org_name_is_terminal() {
        let mut ctx = context(
            MockSource::new(SourceTag::BrokerCheck),
            MockSource::new(SourceTag::SecIapd),
        );
        let mut c = claim(None, Some("John Smith"), None);
        c.organization_name = Some("Unknown Partners".into());
        let outcome = ctx.execute(&c);
        assert!(!outcome.compliant);
        assert_eq!(outcome.strategy, SearchStrategy::SearchWithCorrelated);
        assert!(outcome.explanation.contains("could not be resolved"));
        assert!(outcome.record.is_none());
    }

    #[test]
    fn org_only_and_empty_claims_are_terminal() {
        let mut ctx = context(
            MockSource::new(SourceTag::BrokerCheck),
            MockSource::new(SourceTag::SecIapd),
        );
        let mut org_only = claim(None, None, Some("282563"));
        let outcome = ctx.execute(&org_only);
        assert_eq!(outcome.strategy, SearchStrategy::SearchWithOrgOnly);
        assert!(!outcome.compliant);

        org_only.organization_crd = None;
        let outcome = ctx.execute(&org_only);
        assert_eq!(outcome.strategy, SearchStrategy::NoSearch);
        assert!(outcome.explanation.contains("insufficient identifiers"));
    }

    #[test]
    fn second_run_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = QueryCache::new(Box::new(rdd_store::LocalBlobStore::new(dir.path())));
        let primary = MockSource::new(SourceTag::BrokerCheck).respond(
            "basic",
            "67890",
            basic_hit("67890", "John Smith", true),
        );
        let mut ctx = SearchContext::new(
            cache,
            Box::new(primary),
            Box::new(MockSource::new(SourceTag::SecIapd)),
            OrgDirectory::empty(),
        );
        let c = claim(Some("67890"), None, None);
        assert!(ctx.execute(&c).compliant);

        // A fresh context over the same cache directory with nothing
        // scripted must still identify the individual.
        let cache = QueryCache::new(Box::new(rdd_store::LocalBlobStore::new(dir.path())));
        let mut ctx = SearchContext::new(
            cache,
            Box::new(MockSource::new(SourceTag::BrokerCheck)),
            Box::new(MockSource::new(SourceTag::SecIapd)),
            OrgDirectory::empty(),
        );
        let outcome = ctx.execute(&c);
        assert!(outcome.compliant);
        assert_eq!(outcome.source, SourceTag::BrokerCheck);
    }
}
