//! # The Strategy Decision Table
//!
//! Strategy selection is a pure function of which claim fields are
//! present. An explicit table over the four-bool [`ClaimFeatures`] tuple
//! replaces nested conditionals: sixteen rows, first matching rule wins,
//! exhaustively testable.

use serde::{Deserialize, Serialize};

use rdd_core::ClaimFeatures;

/// The fixed set of lookup strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Direct CRD lookup with an organization CRD available for
    /// correlation fallback.
    SearchWithCrdAndOrg,
    /// Direct CRD lookup only.
    SearchWithCrdOnly,
    /// Name correlated against an organization (CRD supplied or resolved
    /// from the organization name).
    SearchWithCorrelated,
    /// Organization information only — terminal, unsupported.
    SearchWithOrgOnly,
    /// Individual name only — terminal, unsupported without an org.
    NameOnlyFallback,
    /// Nothing usable — terminal, insufficient identifiers.
    NoSearch,
}

impl SearchStrategy {
    /// The wire label (`search_with_correlated`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchWithCrdAndOrg => "search_with_crd_and_org",
            Self::SearchWithCrdOnly => "search_with_crd_only",
            Self::SearchWithCorrelated => "search_with_correlated",
            Self::SearchWithOrgOnly => "search_with_org_only",
            Self::NameOnlyFallback => "name_only_fallback",
            Self::NoSearch => "no_search",
        }
    }

    /// Whether this strategy performs no upstream lookups at all.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SearchWithOrgOnly | Self::NameOnlyFallback | Self::NoSearch
        )
    }
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the strategy for a claim's feature tuple. Precedence order:
/// direct id (with or without org), then name/org correlation, then the
/// terminal unsupported cases.
pub fn resolve_strategy(features: &ClaimFeatures) -> SearchStrategy {
    if features.has_crd && features.has_org_crd {
        SearchStrategy::SearchWithCrdAndOrg
    } else if features.has_crd {
        SearchStrategy::SearchWithCrdOnly
    } else if features.has_name && features.has_org() {
        SearchStrategy::SearchWithCorrelated
    } else if features.has_org() {
        SearchStrategy::SearchWithOrgOnly
    } else if features.has_name {
        SearchStrategy::NameOnlyFallback
    } else {
        SearchStrategy::NoSearch
    }
}
