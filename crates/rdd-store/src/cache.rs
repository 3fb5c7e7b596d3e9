//! # Upstream Query Cache
//!
//! Caches raw upstream payloads per (source, operation, query id, batch).
//! Payloads for one (batch, source, operation) share a single dated file;
//! a `manifest.json` per (batch, source) directory records when each
//! operation was last written.
//!
//! ## Manifest-First Freshness
//!
//! A lookup consults the manifest BEFORE touching the payload file: if the
//! manifest entry is missing or older than the TTL, the lookup is a miss
//! and the (potentially large) payload file is never read or parsed. The
//! payload file is opened only on a fresh manifest hit.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use rdd_core::{BatchId, SourceTag, StoreError};

use crate::blob::BlobStore;

/// Default cache TTL.
pub const DEFAULT_CACHE_TTL_DAYS: i64 = 90;

/// Identifies one cached upstream result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// The source the payload came from.
    pub source: SourceTag,
    /// The operation ("basic", "detailed", "name_org", "disciplinary").
    pub operation: String,
    /// The query identifier (CRD, "name|org", ...).
    pub query_id: String,
    /// The batch the lookup ran under.
    pub batch_id: BatchId,
}

impl CacheKey {
    fn dir(&self) -> String {
        format!("{}/{}", self.batch_id, self.source)
    }

    fn manifest_path(&self) -> String {
        format!("{}/manifest.json", self.dir())
    }

    /// Payload file name per the persisted naming convention:
    /// `{source}_{batchId}_{operation}_{YYYYMMDD}.json`.
    fn file_name(&self, date: DateTime<Utc>) -> String {
        format!(
            "{}_{}_{}_{}.json",
            self.source,
            self.batch_id,
            self.operation,
            date.format("%Y%m%d")
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    operations: BTreeMap<String, ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    written_at: DateTime<Utc>,
    file: String,
}

/// TTL-bounded cache of upstream query results.
pub struct QueryCache {
    store: Box<dyn BlobStore>,
    ttl: Duration,
}

impl QueryCache {
    /// A cache with the default 90-day TTL.
    pub fn new(store: Box<dyn BlobStore>) -> Self {
        Self {
            store,
            ttl: Duration::days(DEFAULT_CACHE_TTL_DAYS),
        }
    }

    /// Override the TTL (tests use short ones).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Look up a cached payload. `Ok(None)` on miss or staleness.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Value>, StoreError> {
        let Some(manifest) = self.read_manifest(key)? else {
            return Ok(None);
        };
        let Some(entry) = manifest.operations.get(&key.operation) else {
            return Ok(None);
        };
        if Utc::now() - entry.written_at >= self.ttl {
            tracing::debug!(
                source = %key.source,
                operation = %key.operation,
                "cache manifest entry stale, treating as miss"
            );
            return Ok(None);
        }

        // Manifest says fresh; only now touch the payload file.
        let path = format!("{}/{}", key.dir(), entry.file);
        let Some(bytes) = self.store.read(&path)? else {
            tracing::warn!(path, "manifest points at a missing payload file");
            return Ok(None);
        };
        let payloads: BTreeMap<String, Value> =
            serde_json::from_slice(&bytes).map_err(|err| StoreError::Corrupt {
                path: path.clone(),
                reason: err.to_string(),
            })?;
        Ok(payloads.get(&key.query_id).cloned())
    }

    /// Store a payload, refreshing the manifest entry.
    pub fn put(&self, key: &CacheKey, payload: &Value) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut manifest = self.read_manifest(key)?.unwrap_or_default();

        // Carry existing entries forward so a date rollover keeps the
        // operation's earlier queries visible.
        let mut payloads: BTreeMap<String, Value> = match manifest.operations.get(&key.operation) {
            Some(entry) => {
                let path = format!("{}/{}", key.dir(), entry.file);
                match self.store.read(&path)? {
                    Some(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
                    None => BTreeMap::new(),
                }
            }
            None => BTreeMap::new(),
        };
        payloads.insert(key.query_id.clone(), payload.clone());

        let file = key.file_name(now);
        let path = format!("{}/{}", key.dir(), file);
        let bytes = serde_json::to_vec_pretty(&payloads).map_err(|err| StoreError::Corrupt {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        self.store.create_dir_all(&key.dir())?;
        self.store.write(&path, &bytes)?;

        manifest
            .operations
            .insert(key.operation.clone(), ManifestEntry { written_at: now, file });
        let manifest_bytes =
            serde_json::to_vec_pretty(&manifest).map_err(|err| StoreError::Corrupt {
                path: key.manifest_path(),
                reason: err.to_string(),
            })?;
        self.store.write(&key.manifest_path(), &manifest_bytes)
    }

    fn read_manifest(&self, key: &CacheKey) -> Result<Option<Manifest>, StoreError> {
        let path = key.manifest_path();
        let Some(bytes) = self.store.read(&path)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| StoreError::Corrupt {
                path,
                reason: err.to_string(),
            })
    }
}
