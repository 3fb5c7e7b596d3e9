//! Blocking HTTP clients for the two public registries.
//!
//! Both registries expose the same search API shape (the IAPD frontend is
//! a rebadged BrokerCheck deployment), so one client type covers both,
//! parameterized by base URL and source tag. Responses come back as raw
//! JSON; normalization happens downstream in [`crate::normalize`].
//!
//! HTTP status mapping: 429 is [`SourceError::RateLimited`], 404 and an
//! empty body are [`Ok(None)`], timeouts are [`SourceError::Timeout`],
//! everything else non-2xx is [`SourceError::Unavailable`] with the status
//! and endpoint in the reason. Retry policy belongs to the caller.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;

use rdd_core::{CrdNumber, OrgCrd, SourceError, SourceTag};

use crate::traits::DataSource;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("rdd/", env!("CARGO_PKG_VERSION"));

/// Configuration for one registry endpoint.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL, no trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl RegistryConfig {
    /// FINRA BrokerCheck public search API.
    pub fn brokercheck() -> Self {
        Self {
            base_url: "https://api.brokercheck.finra.org".into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// SEC IAPD public search API.
    pub fn iapd() -> Self {
        Self {
            base_url: "https://api.adviserinfo.sec.gov".into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// A blocking [`DataSource`] over a registry's public search API.
#[derive(Debug)]
pub struct HttpRegistrySource {
    tag: SourceTag,
    client: Client,
    base_url: String,
}

impl HttpRegistrySource {
    /// Build a client for the given registry.
    pub fn new(tag: SourceTag, config: RegistryConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SourceError::Unavailable {
                source: tag,
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            tag,
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// BrokerCheck with default configuration.
    pub fn brokercheck() -> Result<Self, SourceError> {
        Self::new(SourceTag::BrokerCheck, RegistryConfig::brokercheck())
    }

    /// IAPD with default configuration.
    pub fn iapd() -> Result<Self, SourceError> {
        Self::new(SourceTag::SecIapd, RegistryConfig::iapd())
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Option<Value>, SourceError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout {
                        source: self.tag,
                        attempts: 1,
                    }
                } else {
                    SourceError::Unavailable {
                        source: self.tag,
                        reason: format!("request to {url} failed: {e}"),
                    }
                }
            })?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(SourceError::RateLimited { source: self.tag }),
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.text().map_err(|e| SourceError::Unavailable {
                    source: self.tag,
                    reason: format!("failed to read body from {url}: {e}"),
                })?;
                if body.trim().is_empty() {
                    return Ok(None);
                }
                serde_json::from_str(&body)
                    .map(Some)
                    .map_err(|e| SourceError::Unavailable {
                        source: self.tag,
                        reason: format!("non-JSON body from {url}: {e}"),
                    })
            }
            status => Err(SourceError::Unavailable {
                source: self.tag,
                reason: format!("HTTP {status} from {url}"),
            }),
        }
    }
}

impl DataSource for HttpRegistrySource {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    fn fetch_basic(&mut self, crd: &CrdNumber) -> Result<Option<Value>, SourceError> {
        self.get(
            &format!("/search/individual/{crd}"),
            &[("hl", "true"), ("wt", "json")],
        )
    }

    fn fetch_detailed(&mut self, crd: &CrdNumber) -> Result<Option<Value>, SourceError> {
        self.get(
            &format!("/search/individual/{crd}"),
            &[("hl", "true"), ("type", "Full"), ("wt", "json")],
        )
    }

    fn fetch_by_name_and_org(
        &mut self,
        name: &str,
        org: &OrgCrd,
    ) -> Result<Option<Value>, SourceError> {
        self.get(
            "/search/individual",
            &[
                ("query", name),
                ("firm", org.as_str()),
                ("hl", "true"),
                ("wt", "json"),
            ],
        )
    }

    /// The registries do not serve disciplinary dockets; those come from
    /// separately scraped collaborators.
    fn fetch_disciplinary(
        &mut self,
        _first_name: &str,
        _last_name: &str,
    ) -> Result<Option<Value>, SourceError> {
        Ok(None)
    }
}
