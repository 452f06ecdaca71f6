use cleansam_rs::validate::{ErrorKind, Stringency, ValidationConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cleansam-rs",
    about = "Soft-clip alignments that overhang the end of their reference, then validate the output",
    version
)]
pub struct Args {
    /// Input SAM/BAM
    pub in_bam: PathBuf,

    /// Output SAM/BAM path (format follows the extension)
    #[arg(short = 'o', long = "out", value_name = "SAM/BAM")]
    pub out_bam: PathBuf,

    /// What to do with malformed records and validation errors
    #[arg(long, value_enum, default_value_t = Stringency::Lenient)]
    pub stringency: Stringency,

    /// Validation error kind to ignore (e.g. MISSING_READ_GROUP); repeatable
    #[arg(long = "ignore", value_name = "KIND")]
    pub ignore: Vec<ErrorKind>,

    /// Do not report warnings during validation
    #[arg(long)]
    pub ignore_warnings: bool,

    /// Log individual validation findings
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Verbose mode: log every n-th finding
    #[arg(long, default_value_t = 1)]
    pub sample_every: u64,

    /// Verbose mode: stop logging findings after this many
    #[arg(long, default_value_t = 100)]
    pub max_output: usize,

    /// Paired records kept for mate consistency checks
    #[arg(long, default_value_t = 1024)]
    pub mate_window: usize,

    /// Skip validating the output
    #[arg(long)]
    pub no_validate: bool,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Args {
    pub fn validation_config(&self) -> Option<ValidationConfig> {
        if self.no_validate {
            return None;
        }
        Some(ValidationConfig {
            stringency: self.stringency,
            ignored: self.ignore.iter().copied().collect(),
            ignore_warnings: self.ignore_warnings,
            verbose: self.verbose,
            sample_every: self.sample_every,
            max_output: self.max_output,
            mate_window: self.mate_window,
        })
    }
}
