//! # Batch Run Subcommand
//!
//! Wires the full stack together: CSV ingestion, the cache-backed search
//! context over the two public registries, rule evaluation, and versioned
//! report persistence. Claims are processed strictly one at a time; a
//! failed claim is logged and counted, never fatal to the batch.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use rdd_core::BatchId;
use rdd_engine::DEFAULT_FUZZY_THRESHOLD;
use rdd_search::SearchContext;
use rdd_source::{HttpRegistrySource, OrgDirectory};
use rdd_store::{LocalBlobStore, QueryCache, ReportStore, SaveOutcome};

use crate::ingest::{load_claims, write_skip_report};
use crate::pipeline::Pipeline;

/// Arguments for the `rdd run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Claims CSV to process.
    #[arg(long)]
    pub input: PathBuf,

    /// Directory for cached upstream payloads and report snapshots.
    #[arg(long, default_value = ".rdd")]
    pub data_dir: PathBuf,

    /// Batch correlation id. Generated when omitted.
    #[arg(long)]
    pub batch_id: Option<String>,

    /// Delay after each live upstream call, in milliseconds.
    #[arg(long, default_value_t = 1500)]
    pub delay_ms: u64,

    /// Fuzzy name-match threshold for action filtering (0-100).
    #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
    pub match_threshold: f64,

    /// Line-delimited JSON organization directory (org_name -> org_crd).
    #[arg(long)]
    pub org_directory: Option<PathBuf>,
}

/// Process every claim in the input end to end.
pub fn run_run(args: &RunArgs) -> Result<u8> {
    let batch_id = match &args.batch_id {
        Some(raw) => BatchId::new(raw).context("invalid --batch-id")?,
        None => BatchId::generate(),
    };
    tracing::info!(%batch_id, input = %args.input.display(), "starting batch run");

    let orgs = match &args.org_directory {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open org directory {}", path.display()))?;
            OrgDirectory::from_reader(BufReader::new(file))?
        }
        None => OrgDirectory::empty(),
    };

    let cache = QueryCache::new(Box::new(LocalBlobStore::new(&args.data_dir)));
    let search = SearchContext::new(
        cache,
        Box::new(HttpRegistrySource::brokercheck()?),
        Box::new(HttpRegistrySource::iapd()?),
        orgs,
    )
    .with_rate_limit_delay(Duration::from_millis(args.delay_ms));
    let mut pipeline = Pipeline::new(search).with_threshold(args.match_threshold);
    let store = ReportStore::new(Box::new(LocalBlobStore::new(&args.data_dir)));

    let ingestion = load_claims(&args.input, &batch_id)?;
    if !ingestion.skipped.is_empty() {
        let path = write_skip_report(&args.input, &ingestion.skipped)?;
        println!(
            "{} row(s) diverted to {}",
            ingestion.skipped.len(),
            path.display()
        );
    }

    let mut compliant = 0usize;
    let mut non_compliant = 0usize;
    let mut written = 0usize;
    let mut unchanged = 0usize;
    let mut failed = 0usize;
    for claim in &ingestion.claims {
        let report = match pipeline.process(claim) {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(reference_id = %claim.reference_id, error = %format!("{err:#}"), "claim processing failed");
                failed += 1;
                continue;
            }
        };
        if report.final_evaluation.overall_compliance {
            compliant += 1;
        } else {
            non_compliant += 1;
        }
        match store.save(&batch_id, &report) {
            Ok(SaveOutcome::Written { version }) => {
                written += 1;
                tracing::info!(reference_id = %claim.reference_id, version, "snapshot written");
            }
            Ok(SaveOutcome::Unchanged { version }) => {
                unchanged += 1;
                tracing::info!(reference_id = %claim.reference_id, version, "report unchanged");
            }
            Err(err) => {
                tracing::error!(reference_id = %claim.reference_id, error = %err, "snapshot write failed");
                failed += 1;
            }
        }
    }

    println!(
        "batch {batch_id}: {} claim(s) processed, {compliant} compliant, \
         {non_compliant} non-compliant, {written} snapshot(s) written, \
         {unchanged} unchanged, {failed} failed",
        ingestion.claims.len()
    );
    Ok(if failed > 0 { 1 } else { 0 })
}
