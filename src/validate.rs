//! Structural validation of a stream of alignment records.
//!
//! The engine knows nothing about individual rules: it runs every checker in its
//! registry over every record and folds the findings into a [`ValidationReport`].

use crate::alignment::AlignmentRecord;
use crate::checks::{self, Checker};
use crate::header::AlignmentHeader;
use crate::types::{HashSet, HashSetExt};
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

/// How hard an Error-severity finding hits the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Stringency {
    /// The first error aborts the run.
    Strict,
    /// Errors are reported and the run continues.
    #[default]
    Lenient,
    /// Errors are counted but never logged.
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    EmptyCigar,
    ReadLengthMismatch,
    HardClipNotAtEnd,
    InvalidReferenceIndex,
    InvalidAlignmentStart,
    CigarMapsOffReference,
    InvalidMateReferenceIndex,
    MismatchMateReferenceIndex,
    MismatchMateAlignmentStart,
    MismatchMateUnmappedFlag,
    RecordOutOfOrder,
    MissingReadGroup,
    ReadGroupNotFound,
}

const ERROR_KINDS: [(ErrorKind, &str, Severity); 13] = [
    (ErrorKind::EmptyCigar, "EMPTY_CIGAR", Severity::Error),
    (ErrorKind::ReadLengthMismatch, "READ_LENGTH_MISMATCH", Severity::Error),
    (ErrorKind::HardClipNotAtEnd, "HARD_CLIP_NOT_AT_END", Severity::Error),
    (ErrorKind::InvalidReferenceIndex, "INVALID_REFERENCE_INDEX", Severity::Error),
    (ErrorKind::InvalidAlignmentStart, "INVALID_ALIGNMENT_START", Severity::Error),
    (ErrorKind::CigarMapsOffReference, "CIGAR_MAPS_OFF_REFERENCE", Severity::Error),
    (ErrorKind::InvalidMateReferenceIndex, "INVALID_MATE_REFERENCE_INDEX", Severity::Error),
    (ErrorKind::MismatchMateReferenceIndex, "MISMATCH_MATE_REFERENCE_INDEX", Severity::Error),
    (ErrorKind::MismatchMateAlignmentStart, "MISMATCH_MATE_ALIGNMENT_START", Severity::Error),
    (ErrorKind::MismatchMateUnmappedFlag, "MISMATCH_MATE_UNMAPPED_FLAG", Severity::Error),
    (ErrorKind::RecordOutOfOrder, "RECORD_OUT_OF_ORDER", Severity::Error),
    (ErrorKind::MissingReadGroup, "MISSING_READ_GROUP", Severity::Warning),
    (ErrorKind::ReadGroupNotFound, "READ_GROUP_NOT_FOUND", Severity::Error),
];

impl ErrorKind {
    fn entry(self) -> (ErrorKind, &'static str, Severity) {
        ERROR_KINDS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().1
    }

    pub fn severity(self) -> Severity {
        self.entry().2
    }

    pub fn all() -> impl Iterator<Item = ErrorKind> {
        ERROR_KINDS.iter().map(|(kind, _, _)| *kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ErrorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ErrorKind::all()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow!("unknown validation error kind: {s}"))
    }
}

/// Which record a finding is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContext {
    /// 1-based position in the input.
    pub index: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub record: RecordContext,
    pub message: String,
}

impl ValidationError {
    pub fn new(
        kind: ErrorKind,
        record: &AlignmentRecord,
        ctx: &CheckContext<'_>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            record: RecordContext {
                index: ctx.index,
                name: record.name.clone(),
            },
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: Record {}, Read name {}, {}",
            self.severity, self.kind, self.record.index, self.record.name, self.message
        )
    }
}

#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub stringency: Stringency,
    pub ignored: HashSet<ErrorKind>,
    pub ignore_warnings: bool,
    pub verbose: bool,
    /// With `verbose`, log every n-th retained finding.
    pub sample_every: u64,
    /// With `verbose`, stop logging after this many findings.
    pub max_output: usize,
    /// Paired records kept around for mate checks.
    pub mate_window: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            stringency: Stringency::Lenient,
            ignored: HashSet::new(),
            ignore_warnings: false,
            verbose: false,
            sample_every: 1,
            max_output: 100,
            mate_window: 1024,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub records_checked: u64,
    pub errors: u64,
    pub warnings: u64,
    /// Findings dropped because their kind is ignored.
    pub ignored: u64,
    pub counts: BTreeMap<ErrorKind, u64>,
    /// Findings selected for verbose output.
    pub samples: Vec<ValidationError>,
    pub cancelled: bool,
}

impl ValidationReport {
    pub fn success(&self) -> bool {
        !self.cancelled && self.errors == 0
    }

    pub fn count(&self, kind: ErrorKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counts.is_empty() {
            return writeln!(f, "No errors found");
        }
        writeln!(f, "Error Type\tCount")?;
        for (kind, count) in &self.counts {
            writeln!(f, "{}:{}\t{}", kind.severity(), kind, count)?;
        }
        Ok(())
    }
}

/// Summary of a paired record, kept while its mate may still show up.
#[derive(Debug, Clone)]
pub struct MateInfo {
    pub name: String,
    pub first_segment: bool,
    pub unmapped: bool,
    pub reference_index: Option<usize>,
    pub start: usize,
    pub mate_unmapped: bool,
    pub mate_reference_index: Option<usize>,
    pub mate_start: usize,
}

/// The last `capacity` primary paired records. Mates further apart than that
/// are not cross-checked.
#[derive(Debug)]
pub struct MateWindow {
    capacity: usize,
    entries: VecDeque<MateInfo>,
}

impl MateWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(4096)),
        }
    }

    pub fn find_mate(&self, record: &AlignmentRecord) -> Option<&MateInfo> {
        let first = record.flags.is_first_segment();
        self.entries
            .iter()
            .rev()
            .find(|m| m.first_segment != first && m.name == record.name)
    }

    pub fn push(&mut self, record: &AlignmentRecord) {
        let flags = record.flags;
        if self.capacity == 0
            || !flags.is_segmented()
            || flags.is_secondary()
            || flags.is_supplementary()
        {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(MateInfo {
            name: record.name.clone(),
            first_segment: flags.is_first_segment(),
            unmapped: flags.is_unmapped(),
            reference_index: record.reference_index,
            start: record.start,
            mate_unmapped: flags.is_mate_unmapped(),
            mate_reference_index: record.mate_reference_index,
            mate_start: record.mate_start,
        });
    }
}

/// Everything a checker may look at besides the record itself.
pub struct CheckContext<'a> {
    pub header: &'a AlignmentHeader,
    /// 1-based position of the record being checked.
    pub index: u64,
    pub previous: Option<&'a AlignmentRecord>,
    pub mates: &'a MateWindow,
}

pub struct AlignmentValidator {
    config: ValidationConfig,
    checkers: Vec<Checker>,
}

impl AlignmentValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            checkers: checks::default_checkers(),
        }
    }

    pub fn with_checker(mut self, checker: Checker) -> Self {
        self.checkers.push(checker);
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn validate<I>(&self, records: I, header: &AlignmentHeader) -> Result<ValidationReport>
    where
        I: IntoIterator<Item = Result<AlignmentRecord>>,
    {
        self.validate_until(records, header, &AtomicBool::new(false))
    }

    /// Like [`validate`](Self::validate), but stops between records once `cancel`
    /// is set. A cancelled report never counts as a success.
    pub fn validate_until<I>(
        &self,
        records: I,
        header: &AlignmentHeader,
        cancel: &AtomicBool,
    ) -> Result<ValidationReport>
    where
        I: IntoIterator<Item = Result<AlignmentRecord>>,
    {
        let mut report = ValidationReport::default();
        let mut mates = MateWindow::new(self.config.mate_window);
        let mut previous: Option<AlignmentRecord> = None;
        let mut retained: u64 = 0;

        for result in records {
            if cancel.load(Ordering::Relaxed) {
                report.cancelled = true;
                tracing::warn!(
                    records_checked = report.records_checked,
                    "validation cancelled"
                );
                break;
            }
            let record = result?;
            report.records_checked += 1;

            let ctx = CheckContext {
                header,
                index: report.records_checked,
                previous: previous.as_ref(),
                mates: &mates,
            };
            for checker in &self.checkers {
                for error in checker(&record, &ctx) {
                    if self.config.ignored.contains(&error.kind) {
                        report.ignored += 1;
                        continue;
                    }
                    if error.severity == Severity::Warning && self.config.ignore_warnings {
                        continue;
                    }
                    retained += 1;
                    self.retain(&mut report, error, retained)?;
                }
            }

            mates.push(&record);
            previous = Some(record);
        }

        if self.config.stringency != Stringency::Silent && !report.counts.is_empty() {
            for (kind, count) in &report.counts {
                tracing::info!(kind = %kind, severity = %kind.severity(), count, "validation findings");
            }
        }
        Ok(report)
    }

    fn retain(
        &self,
        report: &mut ValidationReport,
        error: ValidationError,
        retained: u64,
    ) -> Result<()> {
        match error.severity {
            Severity::Error => report.errors += 1,
            Severity::Warning => report.warnings += 1,
        }
        *report.counts.entry(error.kind).or_insert(0) += 1;

        if error.severity == Severity::Error && self.config.stringency == Stringency::Strict {
            return Err(anyhow!("validation aborted: {error}"));
        }

        let sample_every = self.config.sample_every.max(1);
        if self.config.verbose
            && retained % sample_every == 0
            && report.samples.len() < self.config.max_output
        {
            if self.config.stringency != Stringency::Silent {
                match error.severity {
                    Severity::Error => tracing::error!("{error}"),
                    Severity::Warning => tracing::warn!("{error}"),
                }
            }
            report.samples.push(error);
        }
        Ok(())
    }
}
