//! # rdd CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rdd_cli::ingest::{run_ingest, IngestArgs};
use rdd_cli::report::{run_report, ReportArgs};
use rdd_cli::run::{run_run, RunArgs};

/// Regulatory due-diligence batch processor.
///
/// Resolves identity claims against the public broker and adviser
/// registries, evaluates compliance rules per category, and persists
/// versioned compliance reports.
#[derive(Parser, Debug)]
#[command(name = "rdd", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process a claims CSV end to end and persist versioned reports.
    Run(RunArgs),

    /// Dry-run CSV header resolution and row classification.
    Ingest(IngestArgs),

    /// Print the latest stored report for a reference id.
    Report(ReportArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run(args) => run_run(&args),
        Commands::Ingest(args) => run_ingest(&args),
        Commands::Report(args) => run_report(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
