//! Evaluators over the canonical individual record: registration scopes,
//! name agreement, declared license vs active scopes, required exams, and
//! disclosure events.

use rdd_core::{
    Alert, Category, Claim, Disclosure, DisclosureType, EvaluationSection, ExamCategory,
    IndividualRecord, Severity,
};
use rdd_match::names_match;
use serde_json::json;

/// Scope status strings that make a registration concerning.
const CONCERNING_SCOPES: [&str; 6] = [
    "inactive", "temp_wd", "pending", "t_noreg", "tempreg", "restricted",
];

fn scope_is_concerning(scope: &str) -> bool {
    let folded = scope.trim().to_lowercase();
    CONCERNING_SCOPES.contains(&folded.as_str())
}

/// Broker/adviser roles derived from a declared license type string.
///
/// "B" anywhere in the (upper-cased) type claims the broker role, "IA"
/// claims the adviser role. A type may claim both.
fn declared_roles(license_type: &str) -> (bool, bool) {
    let upper = license_type.to_uppercase();
    (upper.contains('B'), upper.contains("IA"))
}

/// Flag any scope whose status string falls in the concerning set.
pub fn evaluate_registration_status(record: &IndividualRecord) -> EvaluationSection {
    let mut alerts = Vec::new();
    for (label, scope) in [
        ("broker", record.broker_scope.as_deref()),
        ("adviser", record.ia_scope.as_deref()),
    ] {
        let Some(status) = scope else { continue };
        if scope_is_concerning(status) {
            alerts.push(
                Alert::new(
                    Category::RegistrationStatus,
                    Severity::High,
                    format!("{label} registration scope is {status:?}"),
                )
                .with_metadata(json!({"scope": label, "status": status})),
            );
        }
    }

    let detail = json!({
        "broker_scope": record.broker_scope,
        "ia_scope": record.ia_scope,
    });
    if alerts.is_empty() {
        EvaluationSection::compliant("registration scopes raise no concerns").with_detail(detail)
    } else {
        let concerning: Vec<&str> = alerts
            .iter()
            .filter_map(|a| a.metadata["status"].as_str())
            .collect();
        EvaluationSection::non_compliant(
            format!("concerning registration scope(s): {}", concerning.join(", ")),
            alerts,
        )
        .with_detail(detail)
    }
}

/// Compare the claim's expected name against the fetched record.
pub fn evaluate_name(claim: &Claim, record: &IndividualRecord) -> EvaluationSection {
    let Some(expected) = claim.display_name() else {
        return EvaluationSection::compliant(
            "claim carries no individual name; name agreement not assessed",
        );
    };
    if names_match(&expected, &record.fetched_name, &record.other_names) {
        return EvaluationSection::compliant(format!(
            "claimed name agrees with the registry record ({:?})",
            record.fetched_name
        ));
    }
    let alert = Alert::new(
        Category::NameMatch,
        Severity::Medium,
        format!(
            "claimed name {expected:?} does not match fetched name {:?}",
            record.fetched_name
        ),
    )
    .with_metadata(json!({
        "expected": expected,
        "fetched": record.fetched_name,
        "alternates": record.other_names,
    }));
    EvaluationSection::non_compliant("claimed and fetched names disagree", vec![alert])
}

/// Check the declared license type against the record's active scopes.
///
/// With no declared type the rule degrades to "at least one scope must be
/// active". With a declared type, the broker/adviser roles it claims must
/// agree exactly with which scopes are active.
pub fn evaluate_license(claim: &Claim, record: &IndividualRecord) -> EvaluationSection {
    let broker_active = IndividualRecord::scope_is_active(record.broker_scope.as_deref());
    let ia_active = IndividualRecord::scope_is_active(record.ia_scope.as_deref());

    let Some(license_type) = claim.license_type.as_deref().filter(|t| !t.trim().is_empty())
    else {
        if broker_active || ia_active {
            return EvaluationSection::compliant(
                "no license type declared; at least one registration scope is active",
            );
        }
        let alert = Alert::new(
            Category::License,
            Severity::High,
            "no active registration in either scope",
        )
        .with_metadata(json!({
            "broker_scope": record.broker_scope,
            "ia_scope": record.ia_scope,
        }));
        return EvaluationSection::non_compliant(
            "no license type declared and neither registration scope is active",
            vec![alert],
        );
    };

    let (wants_broker, wants_ia) = declared_roles(license_type);
    let mut disagreements = Vec::new();
    if wants_broker != broker_active {
        disagreements.push(format!(
            "broker: declared {wants_broker}, scope active {broker_active}"
        ));
    }
    if wants_ia != ia_active {
        disagreements.push(format!(
            "adviser: declared {wants_ia}, scope active {ia_active}"
        ));
    }

    if disagreements.is_empty() {
        return EvaluationSection::compliant(format!(
            "declared license type {license_type:?} agrees with active scopes"
        ));
    }
    let alert = Alert::new(
        Category::License,
        Severity::High,
        format!(
            "declared license type {license_type:?} disagrees with registration scopes: {}",
            disagreements.join("; ")
        ),
    )
    .with_metadata(json!({
        "license_type": license_type,
        "wants_broker": wants_broker,
        "wants_ia": wants_ia,
        "broker_active": broker_active,
        "ia_active": ia_active,
    }));
    EvaluationSection::non_compliant("declared license disagrees with active scopes", vec![alert])
}

/// Check that the record carries the exams each claimed role requires.
///
/// The adviser role requires a Series 65 or 66 pass; the broker role
/// requires Series 7 and one of Series 63 or 66. Roles come from the
/// declared license type, falling back to whichever scopes are active.
pub fn evaluate_exams(claim: &Claim, record: &IndividualRecord) -> EvaluationSection {
    let (wants_broker, wants_ia) = match claim.license_type.as_deref() {
        Some(t) if !t.trim().is_empty() => declared_roles(t),
        _ => (
            IndividualRecord::scope_is_active(record.broker_scope.as_deref()),
            IndividualRecord::scope_is_active(record.ia_scope.as_deref()),
        ),
    };
    if !wants_broker && !wants_ia {
        return EvaluationSection::compliant(
            "no broker or adviser role in play; exam requirements not assessed",
        );
    }

    let has = |exam: ExamCategory| record.exams.contains(&exam);
    let adviser_ok = has(ExamCategory::Series65) || has(ExamCategory::Series66);
    let broker_ok =
        has(ExamCategory::Series7) && (has(ExamCategory::Series63) || has(ExamCategory::Series66));

    let mut missing = Vec::new();
    if wants_ia && !adviser_ok {
        missing.push("adviser (Series 65 or 66)");
    }
    if wants_broker && !broker_ok {
        missing.push("broker (Series 7 plus Series 63 or 66)");
    }

    let detail = json!({"exams": record.exams});
    if missing.is_empty() {
        return EvaluationSection::compliant("required exams are on record for each claimed role")
            .with_detail(detail);
    }
    let description = format!("missing required exams for role(s): {}", missing.join(", "));
    let alert = Alert::new(Category::Exams, Severity::Medium, description.clone());
    EvaluationSection::non_compliant(description, vec![alert]).with_detail(detail)
}

/// The detail keys worth surfacing in an alert, per disclosure type.
fn detail_snippet(disclosure: &Disclosure) -> Option<String> {
    let keys: &[&str] = match &disclosure.disclosure_type {
        DisclosureType::Regulatory => &["sanctions", "initiatedBy"],
        DisclosureType::CustomerDispute => &["allegations", "damageAmountRequested"],
        DisclosureType::Criminal => &["charges"],
        DisclosureType::Civil => &["allegations"],
        DisclosureType::Judgment => &["judgmentType", "amount"],
        DisclosureType::Other(_) => &[],
    };
    keys.iter()
        .find_map(|key| disclosure.detail.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

fn disclosure_description(disclosure: &Disclosure) -> String {
    let date = disclosure
        .event_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "unknown date".to_string());
    let resolution = disclosure
        .resolution
        .as_deref()
        .unwrap_or("no reported resolution");
    let mut description = format!(
        "{} disclosure dated {date}, resolution: {resolution}",
        disclosure.disclosure_type.label()
    );
    if let Some(snippet) = detail_snippet(disclosure) {
        description.push_str(&format!(" ({snippet})"));
    }
    description
}

/// Any disclosure on record fails the section, one High alert per event.
pub fn evaluate_disclosures(record: &IndividualRecord) -> EvaluationSection {
    if record.disclosures.is_empty() {
        return EvaluationSection::compliant("no disclosures on record");
    }
    let alerts: Vec<Alert> = record
        .disclosures
        .iter()
        .map(|d| {
            Alert::new(Category::Disclosures, Severity::High, disclosure_description(d))
                .with_metadata(json!({
                    "disclosure_type": d.disclosure_type.label(),
                    "event_date": d.event_date,
                    "resolution": d.resolution,
                }))
        })
        .collect();
    EvaluationSection::non_compliant(
        format!("{} disclosure(s) on record", record.disclosures.len()),
        alerts,
    )
    .with_detail(json!({"disclosure_count": record.disclosures.len()}))
}
