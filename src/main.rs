mod cli;

use anyhow::{bail, Result};
use clap::Parser;
use cleansam_rs::pipeline::{self, RunOptions};
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            if args.quiet {
                EnvFilter::new("warn")
            } else {
                EnvFilter::new("info")
            }
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = RunOptions {
        input: args.in_bam.clone(),
        output: args.out_bam.clone(),
        stringency: args.stringency,
        validation: args.validation_config(),
    };
    let summary = pipeline::run(&options)?;

    if let Some(report) = &summary.report
        && !report.success()
    {
        eprint!("{report}");
        bail!(
            "validation of {} failed with {} error(s)",
            options.output.display(),
            report.errors
        );
    }
    if summary.stats.malformed_records > 0 {
        bail!(
            "{} malformed record(s) could not be cleaned",
            summary.stats.malformed_records
        );
    }
    tracing::info!(output = %options.output.display(), "cleansam-rs: processing complete");
    Ok(())
}
