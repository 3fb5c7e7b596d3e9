//! # The Data-Source Seam
//!
//! Upstream fetchers may be HTTP JSON calls or browser-driven scrapes; the
//! core requires only that they return a nullable structured payload or a
//! tagged [`SourceError`]. Rate limiting is part of the signature, not an
//! exception: callers match on the variant and decide whether a fallback
//! strategy can still proceed.

use std::collections::HashMap;

use serde_json::Value;

use rdd_core::{CrdNumber, OrgCrd, SourceError, SourceTag};

/// A pluggable upstream regulator data source.
///
/// `None` means the source answered and had nothing — a valid outcome,
/// distinct from every error variant.
pub trait DataSource: Send {
    /// Which regulator system this source queries.
    fn tag(&self) -> SourceTag;

    /// Look an individual up by CRD.
    fn fetch_basic(&mut self, crd: &CrdNumber) -> Result<Option<Value>, SourceError>;

    /// Fetch the detailed record for a CRD (disclosures, exams,
    /// employments). Sources without a detail endpoint return `Ok(None)`.
    fn fetch_detailed(&mut self, crd: &CrdNumber) -> Result<Option<Value>, SourceError>;

    /// Correlate an individual by name within a firm.
    fn fetch_by_name_and_org(
        &mut self,
        name: &str,
        org: &OrgCrd,
    ) -> Result<Option<Value>, SourceError>;

    /// Fetch disciplinary/arbitration/regulatory records by name.
    fn fetch_disciplinary(
        &mut self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Value>, SourceError>;
}

/// A scripted in-memory source for tests and batch dry-runs.
///
/// Responses are keyed by operation + query string; anything not scripted
/// answers `Ok(None)`. Call counts are recorded so tests can assert how
/// many live lookups a strategy path performed.
#[derive(Debug)]
pub struct MockSource {
    tag: SourceTag,
    responses: HashMap<(String, String), Result<Option<Value>, MockFailure>>,
    /// Number of fetches served, by operation name.
    pub calls: HashMap<String, usize>,
}

/// Scripted failure modes for [`MockSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Answer with [`SourceError::RateLimited`].
    RateLimited,
    /// Answer with [`SourceError::Unavailable`].
    Unavailable,
    /// Answer with [`SourceError::Timeout`].
    Timeout,
}

impl MockSource {
    /// A mock with no scripted responses — every lookup misses.
    pub fn new(tag: SourceTag) -> Self {
        Self {
            tag,
            responses: HashMap::new(),
            calls: HashMap::new(),
        }
    }

    /// Script a successful payload for (operation, query).
    pub fn respond(mut self, operation: &str, query: &str, payload: Value) -> Self {
        self.responses
            .insert((operation.into(), query.into()), Ok(Some(payload)));
        self
    }

    /// Script a failure for (operation, query).
    pub fn fail(mut self, operation: &str, query: &str, failure: MockFailure) -> Self {
        self.responses
            .insert((operation.into(), query.into()), Err(failure));
        self
    }

    fn serve(&mut self, operation: &str, query: &str) -> Result<Option<Value>, SourceError> {
        *self.calls.entry(operation.to_string()).or_insert(0) += 1;
        match self.responses.get(&(operation.to_string(), query.to_string())) {
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(MockFailure::RateLimited)) => {
                Err(SourceError::RateLimited { source: self.tag })
            }
            Some(Err(MockFailure::Unavailable)) => Err(SourceError::Unavailable {
                source: self.tag,
                reason: "scripted outage".into(),
            }),
            Some(Err(MockFailure::Timeout)) => Err(SourceError::Timeout {
                source: self.tag,
                attempts: 3,
            }),
            None => Ok(None),
        }
    }
}

impl DataSource for MockSource {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    fn fetch_basic(&mut self, crd: &CrdNumber) -> Result<Option<Value>, SourceError> {
        self.serve("basic", crd.as_str())
    }

    fn fetch_detailed(&mut self, crd: &CrdNumber) -> Result<Option<Value>, SourceError> {
        self.serve("detailed", crd.as_str())
    }

    fn fetch_by_name_and_org(
        &mut self,
        name: &str,
        org: &OrgCrd,
    ) -> Result<Option<Value>, SourceError> {
        self.serve("name_org", &format!("{name}|{org}"))
    }

    fn fetch_disciplinary(
        &mut self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Value>, SourceError> {
        self.serve("disciplinary", &format!("{first_name} {last_name}"))
    }
}
