//! # Normalized Action Records
//!
//! Disciplinary, arbitration, and regulatory actions share one normalized
//! shape; [`ActionKind`] distinguishes which due-diligence category a
//! record belongs to. Each record carries the names the source associated
//! with it — the fuzzy name filter in the rule engine scores those names
//! against the claim and stamps the surviving records with their score.
//!
//! [`DueDiligenceCounters`] keeps found-vs-filtered counts per source even
//! when every record is filtered out, so an auditor can distinguish "we
//! looked and found nothing relevant" from "we never looked".

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identity::SourceTag;

/// Which due-diligence category an action record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Regulator disciplinary proceedings.
    Disciplinary,
    /// Arbitration awards.
    Arbitration,
    /// Administrative/enforcement actions.
    Regulatory,
}

impl ActionKind {
    /// Human-readable label used in alerts and explanations.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disciplinary => "disciplinary action",
            Self::Arbitration => "arbitration award",
            Self::Regulatory => "regulatory action",
        }
    }
}

/// One normalized disciplinary/arbitration/regulatory action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// The record system that reported the action.
    pub source: SourceTag,
    /// Which category the record belongs to.
    pub kind: ActionKind,
    /// Source case/docket identifier.
    pub case_id: String,
    /// Free-text description of the action.
    pub description: String,
    /// Action date, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Names the source associated with the action (primary + aliases).
    pub associated_names: Vec<String>,
    /// Document references (URLs or docket file names).
    #[serde(default)]
    pub documents: Vec<String>,
    /// Source-specific fields kept verbatim for audit.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Fuzzy score against the claim name, stamped by the filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_match_score: Option<f64>,
}

/// Found-vs-filtered counts retained for audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDiligenceCounters {
    /// Total records returned by all sources before name filtering.
    pub records_found: usize,
    /// Records discarded by the fuzzy name filter.
    pub records_filtered: usize,
    /// Per-source (found, filtered) counts, keyed by source label.
    pub per_source: BTreeMap<String, (usize, usize)>,
}

impl DueDiligenceCounters {
    /// Record `found` raw hits and `filtered` discards for one source.
    pub fn record(&mut self, source: SourceTag, found: usize, filtered: usize) {
        self.records_found += found;
        self.records_filtered += filtered;
        let entry = self.per_source.entry(source.as_str().to_string()).or_default();
        entry.0 += found;
        entry.1 += filtered;
    }

    /// Records that survived the name filter.
    pub fn records_retained(&self) -> usize {
        self.records_found - self.records_filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_source() {
        let mut c = DueDiligenceCounters::default();
        c.record(SourceTag::FinraDisciplinary, 4, 3);
        c.record(SourceTag::SecEnforcement, 2, 2);
        assert_eq!(c.records_found, 6);
        assert_eq!(c.records_filtered, 5);
        assert_eq!(c.records_retained(), 1);
        assert_eq!(c.per_source["FINRA_DISCIPLINARY"], (4, 3));
    }
}
