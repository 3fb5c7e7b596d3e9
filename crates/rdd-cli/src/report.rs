//! # Report Retrieval Subcommand
//!
//! Prints the latest stored snapshot for one reference id as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use rdd_core::{BatchId, ReferenceId};
use rdd_store::{LocalBlobStore, ReportStore};

/// Arguments for the `rdd report` subcommand.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Reference id whose report to print.
    #[arg(long)]
    pub reference_id: String,

    /// Batch the report was written under.
    #[arg(long)]
    pub batch_id: String,

    /// Directory holding the report snapshots.
    #[arg(long, default_value = ".rdd")]
    pub data_dir: PathBuf,
}

/// Print the newest snapshot, or report its absence.
pub fn run_report(args: &ReportArgs) -> Result<u8> {
    let reference_id = ReferenceId::new(&args.reference_id).context("invalid --reference-id")?;
    let batch_id = BatchId::new(&args.batch_id).context("invalid --batch-id")?;
    let store = ReportStore::new(Box::new(LocalBlobStore::new(&args.data_dir)));

    match store.latest(&batch_id, &reference_id)? {
        Some((version, report)) => {
            tracing::debug!(%reference_id, version, "printing stored report");
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(0)
        }
        None => {
            println!("no stored report for reference id {reference_id} in batch {batch_id}");
            Ok(1)
        }
    }
}
