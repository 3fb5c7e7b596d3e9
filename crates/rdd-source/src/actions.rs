//! # Action-Payload Normalization
//!
//! Disciplinary, arbitration, and regulatory record systems answer in two
//! shapes: FINRA's list-of-objects under `results`, and the SEC's columnar
//! `columns` + `data` row arrays. Both normalize into [`ActionRecord`]s.
//!
//! ## Shape-Change Tripwire
//!
//! A non-empty payload that yields zero extractable records raises
//! [`NormalizationError::NoActionableRecords`], and that error propagates
//! to the caller. Every other parse problem degrades locally, but this one
//! means the upstream response shape changed underneath us — swallowing it
//! would silently zero the due-diligence counters.

use serde_json::Value;

use rdd_core::{ActionKind, ActionRecord, NormalizationError, SourceTag};

use crate::normalize::parse_date;

/// Normalize a raw action payload into records of the given kind.
///
/// An empty payload (`results: []`, `data: []`, or `null`) is a valid
/// no-findings outcome and returns an empty vec.
pub fn normalize_actions(
    kind: ActionKind,
    source: SourceTag,
    operation: &str,
    raw: &Value,
) -> Result<Vec<ActionRecord>, NormalizationError> {
    if raw.is_null() {
        return Ok(Vec::new());
    }

    let records = if let Some(results) = raw.get("results").and_then(Value::as_array) {
        results
            .iter()
            .filter_map(|item| parse_finra_item(kind, source, item))
            .collect::<Vec<_>>()
    } else if let Some(rows) = raw.get("data").and_then(Value::as_array) {
        let columns = raw
            .get("columns")
            .and_then(Value::as_array)
            .map(|cols| {
                cols.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        rows.iter()
            .filter_map(|row| parse_sec_row(kind, source, &columns, row))
            .collect::<Vec<_>>()
    } else {
        Vec::new()
    };

    if records.is_empty() && !payload_is_empty(raw) {
        return Err(NormalizationError::NoActionableRecords {
            source,
            operation: operation.to_string(),
        });
    }
    Ok(records)
}

/// Whether the payload legitimately carries no records.
fn payload_is_empty(raw: &Value) -> bool {
    let results_empty = match raw.get("results") {
        Some(results) => results.as_array().map(Vec::is_empty).unwrap_or(false),
        None => false,
    };
    let data_empty = match raw.get("data") {
        Some(data) => data.as_array().map(Vec::is_empty).unwrap_or(false),
        None => false,
    };
    results_empty
        || data_empty
        || raw.as_object().map(|o| o.is_empty()).unwrap_or(false)
}

/// FINRA list shape: one object per action.
fn parse_finra_item(kind: ActionKind, source: SourceTag, item: &Value) -> Option<ActionRecord> {
    let case_id = first_string(item, &["caseId", "docketNumber", "caseNumber"]);
    let description = first_string(item, &["description", "caseSummary", "allegations"]);

    let mut names: Vec<String> = item
        .get("individuals")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if let Some(respondent) = first_string(item, &["respondentName", "individualName"]) {
        if !names.contains(&respondent) {
            names.insert(0, respondent);
        }
    }

    // A row with no identifier and no name is noise, not a record.
    if case_id.is_none() && names.is_empty() {
        return None;
    }

    let documents = item
        .get("documents")
        .and_then(Value::as_array)
        .map(|docs| {
            docs.iter()
                .filter_map(|doc| {
                    doc.as_str().map(str::to_string).or_else(|| {
                        doc.get("documentUrl")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(ActionRecord {
        source,
        kind,
        case_id: case_id.unwrap_or_else(|| "unknown".into()),
        description: description.unwrap_or_default(),
        date: first_string(item, &["actionDate", "eventDate", "dateFiled"])
            .as_deref()
            .and_then(parse_date),
        associated_names: names,
        documents,
        metadata: item.clone(),
        name_match_score: None,
    })
}

/// SEC columnar shape: header array + row arrays.
fn parse_sec_row(
    kind: ActionKind,
    source: SourceTag,
    columns: &[String],
    row: &Value,
) -> Option<ActionRecord> {
    let cells = row.as_array()?;
    let cell = |name: &str| -> Option<&Value> {
        columns
            .iter()
            .position(|col| col == name)
            .and_then(|idx| cells.get(idx))
    };
    let cell_str =
        |name: &str| -> Option<String> { cell(name).and_then(Value::as_str).map(str::to_string) };

    let case_id = cell_str("case_id").or_else(|| cell_str("release_number"));
    let name = cell_str("name").or_else(|| cell_str("respondent"));
    if case_id.is_none() && name.is_none() {
        return None;
    }

    Some(ActionRecord {
        source,
        kind,
        case_id: case_id.unwrap_or_else(|| "unknown".into()),
        description: cell_str("description").unwrap_or_default(),
        date: cell_str("date").as_deref().and_then(parse_date),
        associated_names: name.into_iter().collect(),
        documents: cell_str("documents").into_iter().collect(),
        metadata: row.clone(),
        name_match_score: None,
    })
}

fn first_string(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        item.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_results_is_a_valid_no_findings_outcome() {
        let raw = json!({"results": []});
        let records = normalize_actions(
            ActionKind::Disciplinary,
            SourceTag::FinraDisciplinary,
            "disciplinary",
            &raw,
        )
        .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn finra_shape_parses_names_and_documents() {
        let raw = json!({"results": [{
            "caseId": "2019061234",
            "description": "AWC: unsuitable trading",
            "actionDate": "2019-06-14",
            "respondentName": "John Smith",
            "individuals": ["John Smith", "Jonathan Smith"],
            "documents": [{"documentUrl": "https://example.org/awc.pdf"}]
        }]});
        let records = normalize_actions(
            ActionKind::Disciplinary,
            SourceTag::FinraDisciplinary,
            "disciplinary",
            &raw,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.case_id, "2019061234");
        assert_eq!(record.associated_names, vec!["John Smith", "Jonathan Smith"]);
        assert_eq!(record.documents, vec!["https://example.org/awc.pdf"]);
        assert_eq!(record.date, chrono::NaiveDate::from_ymd_opt(2019, 6, 14));
    }

    #[test]
    fn sec_columnar_shape_resolves_cells_by_header() {
        let raw = json!({
            "columns": ["Case_ID", "Name", "Date", "Description"],
            "data": [["3-19000", "John Smith", "2020-01-10", "cease and desist"]]
        });
        let records = normalize_actions(
            ActionKind::Regulatory,
            SourceTag::SecEnforcement,
            "enforcement",
            &raw,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].case_id, "3-19000");
        assert_eq!(records[0].associated_names, vec!["John Smith"]);
    }

    #[test]
    fn non_empty_payload_with_no_records_trips_the_shape_alarm() {
        let raw = json!({"results": [{"unrelated": "shape"}]});
        let err = normalize_actions(
            ActionKind::Arbitration,
            SourceTag::FinraArbitration,
            "arbitration",
            &raw,
        )
        .unwrap_err();
        assert!(matches!(err, NormalizationError::NoActionableRecords { .. }));

        let renamed_keys = json!({"items": [{"caseId": "X"}]});
        let err = normalize_actions(
            ActionKind::Arbitration,
            SourceTag::FinraArbitration,
            "arbitration",
            &renamed_keys,
        )
        .unwrap_err();
        assert!(matches!(err, NormalizationError::NoActionableRecords { .. }));
    }

    #[test]
    fn null_payload_means_source_had_nothing() {
        let records = normalize_actions(
            ActionKind::Regulatory,
            SourceTag::SecEnforcement,
            "enforcement",
            &Value::Null,
        )
        .unwrap();
        assert!(records.is_empty());
    }
}
