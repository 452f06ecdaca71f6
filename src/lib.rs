//! cleansam-rs: soft-clip alignments that run off the end of their reference
//! sequence, then validate the cleaned records.
//!
//! # Library usage
//!
//! ```no_run
//! use cleansam_rs::{clean, AlignmentRecord, Cigar};
//!
//! // let record: AlignmentRecord = /* decoded from SAM/BAM */;
//! // let cleaned = clean(record, reference_length)?;
//! // assert!(cleaned.record.alignment_end() <= reference_length);
//! ```
//!
//! Whole files go through [`pipeline::run`], which cleans an input SAM/BAM into
//! an output file and validates the result with [`AlignmentValidator`].

// Internal modules, not part of the public API.
pub(crate) mod bam_input;
pub(crate) mod bam_output;
pub(crate) mod types;

// Public modules, stable API surface.
pub mod alignment;
pub mod checks;
pub mod cigar;
pub mod clean;
pub mod header;
pub mod pipeline;
pub mod processor;
pub mod validate;

// Flat re-exports for the most commonly used public types.
pub use alignment::{AlignmentRecord, ReferenceDictionary, ReferenceSequence};
pub use cigar::{Cigar, Kind, Op};
pub use clean::{clean, Cleaned, MalformedRecord};
pub use header::{AlignmentHeader, SortOrder};
pub use processor::{ProcessStats, RecordProcessor, RecordSink};
pub use validate::{
    AlignmentValidator, ErrorKind, Severity, Stringency, ValidationConfig, ValidationError,
    ValidationReport,
};
