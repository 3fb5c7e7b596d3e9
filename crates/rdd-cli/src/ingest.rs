//! # Claims CSV Ingestion
//!
//! HR exports name their columns inconsistently; headers are resolved
//! against a canonical alias table before rows are turned into claims.
//! Rows that cannot become a processable claim are diverted to a skip
//! report CSV written next to the input, never silently dropped.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use csv::StringRecord;

use rdd_core::{BatchId, Claim, CrdNumber, OrgCrd, ReferenceId};

/// Arguments for the `rdd ingest` subcommand.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Claims CSV to resolve.
    #[arg(long)]
    pub input: PathBuf,
}

/// Map a raw CSV header to its canonical claim field.
fn canonical_field(header: &str) -> Option<&'static str> {
    let folded: String = header
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    let field = match folded.as_str() {
        "first" | "firstname" | "first_name" | "fname" => "first_name",
        "middle" | "middlename" | "middle_name" | "mname" => "middle_name",
        "last" | "lastname" | "last_name" | "lname" | "surname" => "last_name",
        "suffix" | "name_suffix" => "suffix",
        "name" | "full_name" | "individual_name" | "individual" => "individual_name",
        "crd" | "crd_number" | "crd_no" | "individual_crd" => "crd",
        "org_crd" | "organization_crd" | "firm_crd" | "org_crd_number" => "organization_crd",
        "org" | "organization" | "org_name" | "organization_name" | "firm" | "firm_name"
        | "company" => "organization_name",
        "license" | "license_type" | "registration_type" => "license_type",
        "reference" | "reference_id" | "ref" | "ref_id" | "record_id" => "reference_id",
        "employee" | "employee_id" | "emp_id" | "employeeid" | "worker_id" => "employee_id",
        _ => return None,
    };
    Some(field)
}

/// A row diverted from the pipeline, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedRow {
    /// 1-based CSV line number (header excluded).
    pub line: u64,
    pub reason: String,
    pub raw: StringRecord,
}

/// The outcome of resolving one claims CSV.
#[derive(Debug)]
pub struct Ingestion {
    pub claims: Vec<Claim>,
    pub skipped: Vec<SkippedRow>,
    /// Raw headers that resolved to no canonical field.
    pub unrecognized_headers: Vec<String>,
}

fn row_value(row: &StringRecord, fields: &HashMap<&'static str, usize>, field: &str) -> Option<String> {
    fields
        .get(field)
        .and_then(|&idx| row.get(idx))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolve headers and convert rows into claims.
///
/// A row must carry a reference or employee id (the report versioning
/// key) and at least one of a name, an employee id, or an organization
/// identifier; anything else is diverted with a deterministic reason.
pub fn load_claims(path: &Path, batch_id: &BatchId) -> Result<Ingestion> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut fields: HashMap<&'static str, usize> = HashMap::new();
    let mut unrecognized_headers = Vec::new();
    for (idx, header) in reader
        .headers()
        .context("claims CSV has no header row")?
        .iter()
        .enumerate()
    {
        match canonical_field(header) {
            // First occurrence wins when two headers alias the same field.
            Some(field) => {
                fields.entry(field).or_insert(idx);
            }
            None => unrecognized_headers.push(header.to_string()),
        }
    }

    let mut claims = Vec::new();
    let mut skipped = Vec::new();
    for (offset, row) in reader.records().enumerate() {
        let line = offset as u64 + 1;
        let row = row.with_context(|| format!("failed to read CSV row {line}"))?;
        match claim_from_row(&row, &fields, batch_id) {
            Ok(claim) => claims.push(claim),
            Err(reason) => {
                tracing::info!(line, %reason, "row diverted to skip report");
                skipped.push(SkippedRow { line, reason, raw: row });
            }
        }
    }
    Ok(Ingestion {
        claims,
        skipped,
        unrecognized_headers,
    })
}

fn claim_from_row(
    row: &StringRecord,
    fields: &HashMap<&'static str, usize>,
    batch_id: &BatchId,
) -> Result<Claim, String> {
    let value = |field: &str| row_value(row, fields, field);

    let individual_name = value("individual_name");
    let first_name = value("first_name");
    let last_name = value("last_name");
    let employee_id = value("employee_id");
    let organization_crd_raw = value("organization_crd");
    let organization_name = value("organization_name");

    let has_name = individual_name.is_some() || (first_name.is_some() && last_name.is_some());
    let has_org = organization_crd_raw.is_some() || organization_name.is_some();
    if !has_name && employee_id.is_none() && !has_org {
        return Err(
            "row carries no name, no employee id, and no organization identifier".into(),
        );
    }

    let reference_raw = value("reference_id")
        .or(employee_id)
        .ok_or_else(|| {
            "row carries no reference or employee id to version reports under".to_string()
        })?;
    let reference_id = ReferenceId::new(&reference_raw)
        .map_err(|err| format!("invalid reference id {reference_raw:?}: {err}"))?;

    let crd = value("crd")
        .map(|raw| CrdNumber::new(&raw).map_err(|err| format!("invalid CRD {raw:?}: {err}")))
        .transpose()?;
    let organization_crd = organization_crd_raw
        .map(|raw| {
            OrgCrd::new(&raw).map_err(|err| format!("invalid organization CRD {raw:?}: {err}"))
        })
        .transpose()?;

    Ok(Claim {
        individual_name,
        first_name,
        middle_name: value("middle_name"),
        last_name,
        suffix: value("suffix"),
        crd,
        organization_crd,
        organization_name,
        license_type: value("license_type"),
        reference_id,
        batch_id: batch_id.clone(),
    })
}

/// Write the skip report next to the input: `{stem}_skipped.csv`.
pub fn write_skip_report(input: &Path, skipped: &[SkippedRow]) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("claims");
    let path = input.with_file_name(format!("{stem}_skipped.csv"));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create skip report {}", path.display()))?;
    writer.write_record(["line", "reason", "row"])?;
    for row in skipped {
        let raw: Vec<&str> = row.raw.iter().collect();
        writer.write_record([row.line.to_string(), row.reason.clone(), raw.join("|")])?;
    }
    writer.flush()?;
    Ok(path)
}

/// Dry-run header resolution and row classification.
pub fn run_ingest(args: &IngestArgs) -> Result<u8> {
    let batch_id = BatchId::generate();
    let ingestion = load_claims(&args.input, &batch_id)?;
    for header in &ingestion.unrecognized_headers {
        println!("unrecognized header: {header:?}");
    }
    for row in &ingestion.skipped {
        println!("skip line {}: {}", row.line, row.reason);
    }
    println!(
        "{} accepted, {} skipped",
        ingestion.claims.len(),
        ingestion.skipped.len()
    );
    Ok(0)
}
