//! # Registry Payload Normalization
//!
//! Maps either registry's raw response into the one canonical
//! [`IndividualRecord`]. Absence of data is a valid outcome: a payload with
//! no hits normalizes to an empty record, never an error.
//!
//! ## The JSON-in-JSON Contract
//!
//! Both registries embed the detailed individual document as a JSON-encoded
//! STRING inside the outer JSON response — BrokerCheck under the `content`
//! key, IAPD under `iacontent`. This two-stage decode is an upstream data
//! contract, not a design choice here; it is kept as an explicit step. If
//! the embedded document fails to decode, the failure is logged and the
//! detail lists (disclosures, exams, employments) fall back to empty rather
//! than failing the whole normalization.

use serde_json::Value;

use rdd_core::{
    BranchOffice, CrdNumber, Disclosure, DisclosureType, Employment, IndividualRecord,
    NormalizationError, OrgCrd, SourceTag,
};

use crate::exams::recognize_exam;

/// Normalize a registry's basic (and optionally detailed) payload.
///
/// `raw_basic` with no hits yields `Ok(empty record)`. A structurally
/// alien basic payload — hits present but not readable — is
/// [`NormalizationError::MalformedPayload`].
pub fn normalize_individual(
    source: SourceTag,
    raw_basic: &Value,
    raw_detailed: Option<&Value>,
) -> Result<IndividualRecord, NormalizationError> {
    let mut record = IndividualRecord::empty(source);

    let Some(hit) = first_hit(raw_basic) else {
        if total_hits(raw_basic) > 0 {
            return Err(NormalizationError::MalformedPayload {
                source,
                reason: "hits.total > 0 but hits.hits carries no readable _source".into(),
            });
        }
        return Ok(record);
    };

    record.crd = hit
        .get("ind_source_id")
        .and_then(value_as_id_string)
        .and_then(|raw| CrdNumber::new(&raw).ok());
    record.fetched_name = join_name_fields(
        hit.get("ind_firstname"),
        hit.get("ind_middlename"),
        hit.get("ind_lastname"),
    );
    record.other_names = string_list(hit.get("ind_other_names"));
    record.broker_scope = non_empty_string(hit.get("ind_bc_scope"));
    record.ia_scope = non_empty_string(hit.get("ind_ia_scope"));

    // Basic responses embed the same document; it is the fallback when no
    // detailed payload was fetched.
    let document = match raw_detailed {
        Some(detailed) => decode_embedded_document(source, detailed),
        None => decode_hit_document(source, hit),
    };
    if let Some(document) = document {
        apply_detail(&mut record, &document);
    }

    Ok(record)
}

/// The embedded-document key each registry uses.
fn content_key(source: SourceTag) -> &'static str {
    match source {
        SourceTag::SecIapd => "iacontent",
        // Action-record systems never carry an embedded individual document;
        // treating them like BrokerCheck keeps the lookup total.
        _ => "content",
    }
}

/// Stage two of the decode: pull the JSON-encoded document string out of
/// the detailed response and parse it.
fn decode_embedded_document(source: SourceTag, raw_detailed: &Value) -> Option<Value> {
    let hit = first_hit(raw_detailed)?;
    decode_hit_document(source, hit)
}

fn decode_hit_document(source: SourceTag, hit: &Value) -> Option<Value> {
    let key = content_key(source);
    let Some(encoded) = hit.get(key).and_then(Value::as_str) else {
        tracing::debug!(%source, key, "detailed payload carries no embedded document");
        return None;
    };
    match serde_json::from_str::<Value>(encoded) {
        Ok(document) => Some(document),
        Err(err) => {
            tracing::warn!(
                %source,
                key,
                error = %err,
                "embedded document failed to decode; detail lists fall back to empty"
            );
            None
        }
    }
}

/// Read disclosures, exams, and employments out of the decoded document.
fn apply_detail(record: &mut IndividualRecord, document: &Value) {
    if let Some(basic) = document.get("basicInformation") {
        if record.fetched_name.trim().is_empty() {
            record.fetched_name = join_name_fields(
                basic.get("firstName"),
                basic.get("middleName"),
                basic.get("lastName"),
            );
        }
        if record.other_names.is_empty() {
            record.other_names = string_list(basic.get("otherNames"));
        }
        if record.broker_scope.is_none() {
            record.broker_scope = non_empty_string(basic.get("bcScope"));
        }
        if record.ia_scope.is_none() {
            record.ia_scope = non_empty_string(basic.get("iaScope"));
        }
    }

    if let Some(items) = document.get("disclosures").and_then(Value::as_array) {
        record.disclosures = items.iter().map(parse_disclosure).collect();
    }

    // Exams arrive split across up to three category arrays.
    for key in ["examsCategory", "stateExamCategory", "principalExamCategory"] {
        if let Some(items) = document.get(key).and_then(Value::as_array) {
            for item in items {
                let label = item
                    .get("examCategory")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if let Some(category) = recognize_exam(label) {
                    if !record.exams.contains(&category) {
                        record.exams.push(category);
                    }
                }
            }
        }
    }

    if let Some(items) = document.get("currentEmployments").and_then(Value::as_array) {
        record.employments = items.iter().map(parse_employment).collect();
    }
}

fn parse_disclosure(item: &Value) -> Disclosure {
    Disclosure {
        event_date: item
            .get("eventDate")
            .and_then(Value::as_str)
            .and_then(parse_date),
        disclosure_type: DisclosureType::from_source(
            item.get("disclosureType")
                .and_then(Value::as_str)
                .unwrap_or(""),
        ),
        resolution: non_empty_string(item.get("disclosureResolution")),
        detail: item.get("disclosureDetail").cloned().unwrap_or(Value::Null),
    }
}

fn parse_employment(item: &Value) -> Employment {
    Employment {
        firm_crd: item
            .get("firmId")
            .and_then(value_as_id_string)
            .and_then(|raw| OrgCrd::new(&raw).ok()),
        firm_name: non_empty_string(item.get("firmName")),
        registration_begin: item
            .get("registrationBeginDate")
            .and_then(Value::as_str)
            .and_then(parse_date),
        branch_offices: item
            .get("branchOfficeLocations")
            .and_then(Value::as_array)
            .map(|offices| {
                offices
                    .iter()
                    .map(|office| BranchOffice {
                        city: non_empty_string(office.get("city")),
                        state: non_empty_string(office.get("state")),
                        zip: non_empty_string(office.get("zipCode")),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Registry dates arrive as either `M/D/YYYY` or ISO `YYYY-MM-DD`.
pub(crate) fn parse_date(raw: &str) -> Option<chrono::NaiveDate> {
    let trimmed = raw.trim();
    chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| chrono::NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .ok()
}

fn first_hit(payload: &Value) -> Option<&Value> {
    payload
        .get("hits")?
        .get("hits")?
        .as_array()?
        .first()?
        .get("_source")
}

fn total_hits(payload: &Value) -> u64 {
    let total = match payload.get("hits").and_then(|h| h.get("total")) {
        Some(total) => total,
        None => return 0,
    };
    // Both `"total": 3` and the newer `"total": {"value": 3}` occur.
    total
        .as_u64()
        .or_else(|| total.get("value").and_then(Value::as_u64))
        .unwrap_or(0)
}

fn join_name_fields(first: Option<&Value>, middle: Option<&Value>, last: Option<&Value>) -> String {
    [first, middle, last]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// CRDs arrive as strings in some payloads, numbers in others.
fn value_as_id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
