use crate::alignment::{cigar_to_sam, AlignmentRecord};
use crate::bam_input::open_bam;
use crate::bam_output::create_bam;
use crate::header::AlignmentHeader;
use crate::processor::{ProcessStats, RecordProcessor};
use crate::validate::{AlignmentValidator, Stringency, ValidationConfig, ValidationReport};
use anyhow::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Applies to malformed records met while cleaning.
    pub stringency: Stringency,
    /// Validate the output once it is written; `None` skips the pass.
    pub validation: Option<ValidationConfig>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub stats: ProcessStats,
    pub report: Option<ValidationReport>,
}

impl RunSummary {
    /// Every record was fine or cleaned, and validation (if run) found no errors.
    pub fn success(&self) -> bool {
        self.stats.malformed_records == 0
            && self.report.as_ref().is_none_or(ValidationReport::success)
    }
}

/// Clean `input` into `output`, then validate `output`.
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let stats = clean_file(&options.input, &options.output, options.stringency)?;
    tracing::info!(
        total_records = stats.total_records,
        unmapped_records = stats.unmapped_records,
        cleaned_records = stats.cleaned_records,
        clipped_bases = stats.clipped_bases,
        malformed_records = stats.malformed_records,
        "cleaning complete"
    );

    let report = match &options.validation {
        Some(config) => {
            let report = validate_file(&options.output, config.clone())?;
            tracing::info!(
                records_checked = report.records_checked,
                errors = report.errors,
                warnings = report.warnings,
                ignored = report.ignored,
                "validation complete"
            );
            Some(report)
        }
        None => None,
    };

    Ok(RunSummary { stats, report })
}

/// Stream records from `input` to `output`, soft-clipping reference overhangs.
///
/// Only the CIGAR of a cleaned record is rewritten; every other field is
/// written back exactly as it was decoded.
pub fn clean_file(input: &Path, output: &Path, stringency: Stringency) -> Result<ProcessStats> {
    let mut bam = open_bam(input)?;
    let header = bam.header.clone();
    let summary = AlignmentHeader::from_sam_header(&header);
    let mut writer = create_bam(output, &header)?;
    let mut processor = RecordProcessor::new(&summary.dictionary, stringency);

    for result in &mut bam {
        let mut record = result?;
        let view = AlignmentRecord::from_record_buf(&record)?;
        let cleaned = processor.process(view)?;
        if cleaned.changed {
            *record.cigar_mut() = cigar_to_sam(&cleaned.record.cigar);
        }
        writer.write(&record)?;
    }
    writer.finish()?;

    Ok(processor.into_stats())
}

pub fn validate_file(path: &Path, config: ValidationConfig) -> Result<ValidationReport> {
    let bam = open_bam(path)?;
    let header = AlignmentHeader::from_sam_header(&bam.header);
    let validator = AlignmentValidator::new(config);
    validator.validate(bam.alignment_records(), &header)
}
