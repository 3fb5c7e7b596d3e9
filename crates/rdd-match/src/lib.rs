//! # rdd-match — Person-Name Matching
//!
//! Two matching modes with deliberately different strictness:
//!
//! - [`names_match`] — identity confirmation. Case-folded exact equality,
//!   or an order-insensitive first/last token rule that tolerates
//!   first/last transposition and ignores middle names and suffixes.
//!   Alternate names on file are tried with the same rule.
//! - [`similarity`] — fuzzy scoring in `[0, 100]`, used only for filtering
//!   disciplinary/arbitration/regulatory hits against a claim name. A hit
//!   is retained only when its best score reaches the threshold
//!   (boundary inclusive, default [`DEFAULT_FUZZY_THRESHOLD`]). This keeps
//!   unrelated same-surname individuals out of due-diligence findings.
//!
//! ## Scoring Tiers
//!
//! `100` exact normalized equality, `90` substring containment (query of
//! meaningful length), `85` first/last token-rule match, otherwise Jaccard
//! token overlap scaled to `[0, 100]`. The token tier sits above the
//! default threshold so a transposed-name hit survives filtering, and
//! below the substring tier so containment still outranks it.

use serde::Serialize;

/// Default retention threshold for fuzzy filtering.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 80.0;

/// Normalize a name for comparison: case-fold, map punctuation to spaces,
/// collapse whitespace.
pub fn normalize_name(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let cleaned: String = lower
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

/// Which rule produced a match. Persisted in section detail for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Normalized strings were identical.
    Exact,
    /// First/last tokens agreed, in either order.
    TokenOrder,
    /// One normalized name contained the other.
    Substring,
    /// Jaccard token overlap.
    TokenOverlap,
}

/// Exact-or-token match between two single names.
///
/// The token rule applies only when both names split into at least two
/// tokens: (first == first AND last == last) OR the transposed pairing.
/// Middle tokens are ignored by construction.
fn single_match(expected_norm: &str, candidate: &str) -> Option<MatchRule> {
    let candidate_norm = normalize_name(candidate);
    if candidate_norm.is_empty() || expected_norm.is_empty() {
        return None;
    }
    if expected_norm == candidate_norm {
        return Some(MatchRule::Exact);
    }
    let a = tokens(expected_norm);
    let b = tokens(&candidate_norm);
    if a.len() >= 2 && b.len() >= 2 {
        let (a_first, a_last) = (a[0], a[a.len() - 1]);
        let (b_first, b_last) = (b[0], b[b.len() - 1]);
        if (a_first == b_first && a_last == b_last)
            || (a_first == b_last && a_last == b_first)
        {
            return Some(MatchRule::TokenOrder);
        }
    }
    None
}

/// Identity-confirmation match: `expected` against `fetched` and each of
/// the individual's alternate names, until one matches or the list is
/// exhausted.
pub fn names_match(expected: &str, fetched: &str, alternates: &[String]) -> bool {
    let expected_norm = normalize_name(expected);
    if expected_norm.is_empty() {
        return false;
    }
    if single_match(&expected_norm, fetched).is_some() {
        return true;
    }
    alternates
        .iter()
        .any(|alt| single_match(&expected_norm, alt).is_some())
}

/// Score one candidate name against the normalized query.
fn score_pair(expected_norm: &str, candidate: &str) -> (f64, MatchRule) {
    let candidate_norm = normalize_name(candidate);
    if expected_norm.is_empty() || candidate_norm.is_empty() {
        return (0.0, MatchRule::TokenOverlap);
    }
    if expected_norm == candidate_norm {
        return (100.0, MatchRule::Exact);
    }
    if expected_norm.len() >= 3
        && (candidate_norm.contains(expected_norm) || expected_norm.contains(&candidate_norm))
    {
        return (90.0, MatchRule::Substring);
    }
    if single_match(expected_norm, candidate) == Some(MatchRule::TokenOrder) {
        return (85.0, MatchRule::TokenOrder);
    }
    let a: std::collections::HashSet<&str> = tokens(expected_norm).into_iter().collect();
    let b: std::collections::HashSet<&str> = tokens(&candidate_norm).into_iter().collect();
    let total = a.union(&b).count();
    if total == 0 {
        return (0.0, MatchRule::TokenOverlap);
    }
    let overlap = a.intersection(&b).count();
    (overlap as f64 / total as f64 * 100.0, MatchRule::TokenOverlap)
}

/// One candidate's score, kept in the audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    /// The candidate name as reported by the source.
    pub candidate: String,
    /// Score in `[0, 100]`.
    pub score: f64,
    /// The rule that produced the score.
    pub rule: MatchRule,
}

/// Audit trail for one fuzzy comparison.
#[derive(Debug, Clone, Serialize)]
pub struct MatchDetails {
    /// The claim name the comparison ran against.
    pub query: String,
    /// The threshold applied (after clamping).
    pub threshold: f64,
    /// The best-scoring candidate, when any candidate was non-empty.
    pub best_candidate: Option<String>,
    /// Every candidate's score.
    pub scores: Vec<CandidateScore>,
}

/// Clamp a caller-supplied threshold into `[0, 100]`.
///
/// NaN falls back to the default; out-of-range values are clamped with a
/// warning rather than rejected, matching how screening thresholds are
/// handled elsewhere in the stack.
fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        tracing::warn!("fuzzy threshold is NaN, using default {DEFAULT_FUZZY_THRESHOLD}");
        DEFAULT_FUZZY_THRESHOLD
    } else if threshold < 0.0 {
        tracing::warn!(threshold, "fuzzy threshold below 0, clamping to 0");
        0.0
    } else if threshold > 100.0 {
        tracing::warn!(threshold, "fuzzy threshold above 100, clamping to 100");
        100.0
    } else {
        threshold
    }
}

/// Fuzzy similarity between the claim name and an action record's
/// associated names.
///
/// Returns the audit trail and `Some(best_score)` when the record should
/// be retained (best score ≥ threshold, boundary inclusive), `None` when
/// it should be discarded. An empty candidate set, or one containing only
/// empty names, scores 0 and is discarded.
pub fn similarity(
    expected: &str,
    candidate: &str,
    candidate_alternates: &[String],
    threshold: f64,
) -> (MatchDetails, Option<f64>) {
    let threshold = clamp_threshold(threshold);
    let expected_norm = normalize_name(expected);

    let mut scores = Vec::new();
    let mut best: Option<(f64, String)> = None;
    for name in std::iter::once(candidate).chain(candidate_alternates.iter().map(String::as_str)) {
        if normalize_name(name).is_empty() {
            continue;
        }
        let (score, rule) = score_pair(&expected_norm, name);
        if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
            best = Some((score, name.to_string()));
        }
        scores.push(CandidateScore {
            candidate: name.to_string(),
            score,
            rule,
        });
    }

    let details = MatchDetails {
        query: expected.to_string(),
        threshold,
        best_candidate: best.as_ref().map(|(_, name)| name.clone()),
        scores,
    };
    match best {
        Some((score, _)) if score >= threshold => (details, Some(score)),
        _ => (details, None),
    }
}
