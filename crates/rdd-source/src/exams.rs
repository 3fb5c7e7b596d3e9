//! # Exam Label Recognition
//!
//! Registries report exam passes as free-ish text ("Series 7TO",
//! "Series 66 - Uniform Combined State Law Examination"). Recognition runs
//! against a fixed table ordered longest-pattern-first so "Series 7TO"
//! is claimed before a partial "Series 7" hit, and "Series 9/10" before
//! anything shorter. Each raw entry contributes at most one canonical tag.

use rdd_core::ExamCategory;

/// The recognition table. Order is load-bearing: longest patterns first.
const EXAM_PATTERNS: &[(&str, ExamCategory)] = &[
    ("series 9/10", ExamCategory::Series9_10),
    ("series 7to", ExamCategory::Series7To),
    ("series 24", ExamCategory::Series24),
    ("series 63", ExamCategory::Series63),
    ("series 65", ExamCategory::Series65),
    ("series 66", ExamCategory::Series66),
    ("series 79", ExamCategory::Series79),
    ("series 82", ExamCategory::Series82),
    ("series 99", ExamCategory::Series99),
    ("series 7", ExamCategory::Series7),
    ("series 6", ExamCategory::Series6),
    ("sie", ExamCategory::Sie),
];

/// Recognize a raw exam label, case-insensitively.
///
/// Returns `None` for labels outside the table — unknown exams are simply
/// not part of the canonical record.
pub fn recognize_exam(raw: &str) -> Option<ExamCategory> {
    let folded = raw.trim().to_lowercase();
    if folded.is_empty() {
        return None;
    }
    EXAM_PATTERNS
        .iter()
        .find(|(pattern, _)| folded.contains(pattern))
        .map(|(_, category)| *category)
}
