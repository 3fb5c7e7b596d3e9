//! # Versioned Report Store
//!
//! Compliance reports are persisted as immutable, append-only snapshots
//! named `ComplianceReportAgent_{referenceId}_v{N}_{YYYYMMDD}.json`, where
//! `N` increases per reference id per day.
//!
//! ## Change-Gated Writes
//!
//! Before writing, the newest existing snapshot for the reference id is
//! loaded and diffed against the candidate over [`TrackedFields`] (overall
//! compliance, each section's flag, total alert count). Equal tuples make
//! the write a successful no-op, so re-running identical claims never
//! grows the version history.
//!
//! ## Write Serialization
//!
//! The read-diff-write sequence runs under a per-reference-id lock: two
//! workers racing on the same reference id could otherwise both observe
//! "no existing version" and double-write.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use rdd_core::{BatchId, ComplianceReport, ReferenceId, StoreError};

use crate::blob::BlobStore;

/// Result of a [`ReportStore::save`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new snapshot was written with this version number.
    Written {
        /// The version number of the new snapshot.
        version: u32,
    },
    /// The newest stored snapshot already matches; nothing was written.
    Unchanged {
        /// The version number of the matching snapshot.
        version: u32,
    },
}

/// Append-only, change-gated report snapshot store.
pub struct ReportStore {
    store: Box<dyn BlobStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ReportStore {
    /// Create a report store over the given backend.
    pub fn new(store: Box<dyn BlobStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn dir(batch_id: &BatchId) -> String {
        format!("{batch_id}/reports")
    }

    fn lock_for(&self, reference_id: &ReferenceId) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(reference_id.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Persist a report snapshot unless the newest stored snapshot already
    /// carries the same tracked fields.
    pub fn save(
        &self,
        batch_id: &BatchId,
        report: &ComplianceReport,
    ) -> Result<SaveOutcome, StoreError> {
        let lock = self.lock_for(&report.reference_id);
        let _guard = lock.lock();

        let dir = Self::dir(batch_id);
        let snapshots = self.snapshot_names(&dir, &report.reference_id)?;

        if let Some((newest_name, newest_version)) = newest(&snapshots, &report.reference_id) {
            let previous = self.load_snapshot(&dir, newest_name)?;
            if previous.tracked_fields() == report.tracked_fields() {
                tracing::debug!(
                    reference_id = %report.reference_id,
                    version = newest_version,
                    "report unchanged, skipping snapshot write"
                );
                return Ok(SaveOutcome::Unchanged {
                    version: newest_version,
                });
            }
        }

        let today = Utc::now().format("%Y%m%d").to_string();
        let next_version = snapshots
            .iter()
            .filter_map(|name| parse_snapshot_name(name, &report.reference_id))
            .filter(|(_, date)| *date == today)
            .map(|(version, _)| version)
            .max()
            .unwrap_or(0)
            + 1;

        let file = format!(
            "ComplianceReportAgent_{}_v{}_{}.json",
            report.reference_id, next_version, today
        );
        let path = format!("{dir}/{file}");
        let bytes = serde_json::to_vec_pretty(report).map_err(|err| StoreError::Corrupt {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        self.store.create_dir_all(&dir)?;
        self.store.write(&path, &bytes)?;
        tracing::info!(
            reference_id = %report.reference_id,
            version = next_version,
            "report snapshot written"
        );
        Ok(SaveOutcome::Written {
            version: next_version,
        })
    }

    /// Load the newest stored snapshot for a reference id.
    pub fn latest(
        &self,
        batch_id: &BatchId,
        reference_id: &ReferenceId,
    ) -> Result<Option<(u32, ComplianceReport)>, StoreError> {
        let dir = Self::dir(batch_id);
        let snapshots = self.snapshot_names(&dir, reference_id)?;
        let Some((name, version)) = newest(&snapshots, reference_id) else {
            return Ok(None);
        };
        Ok(Some((version, self.load_snapshot(&dir, name)?)))
    }

    fn snapshot_names(
        &self,
        dir: &str,
        reference_id: &ReferenceId,
    ) -> Result<Vec<String>, StoreError> {
        self.store.list(
            dir,
            &format!("ComplianceReportAgent_{reference_id}_v*_*.json"),
        )
    }

    fn load_snapshot(&self, dir: &str, name: &str) -> Result<ComplianceReport, StoreError> {
        let path = format!("{dir}/{name}");
        let Some(bytes) = self.store.read(&path)? else {
            return Err(StoreError::Corrupt {
                path,
                reason: "listed snapshot vanished before read".into(),
            });
        };
        serde_json::from_slice(&bytes).map_err(|err| StoreError::Corrupt {
            path,
            reason: err.to_string(),
        })
    }
}

/// Parse `(version, date)` out of a snapshot file name by stripping the
/// known prefix/suffix, so reference ids containing underscores survive.
fn parse_snapshot_name(name: &str, reference_id: &ReferenceId) -> Option<(u32, String)> {
    let prefix = format!("ComplianceReportAgent_{reference_id}_v");
    let rest = name.strip_prefix(&prefix)?.strip_suffix(".json")?;
    let (version, date) = rest.split_once('_')?;
    Some((version.parse().ok()?, date.to_string()))
}

/// The newest snapshot: max date, then max version within it.
fn newest<'a>(names: &'a [String], reference_id: &ReferenceId) -> Option<(&'a str, u32)> {
    names
        .iter()
        .filter_map(|name| {
            parse_snapshot_name(name, reference_id)
                .map(|(version, date)| (date, version, name.as_str()))
        })
        .max()
        .map(|(_, version, name)| (name, version))
}
