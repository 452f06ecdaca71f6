use crate::alignment::AlignmentRecord;
use crate::cigar::Kind;
use crate::header::SortOrder;
use crate::validate::{CheckContext, ErrorKind, ValidationError};
use std::cmp::Ordering;

/// A single validation rule. Checkers are independent of each other and of the
/// engine; adding one never touches the others.
pub type Checker = fn(&AlignmentRecord, &CheckContext<'_>) -> Vec<ValidationError>;

pub fn default_checkers() -> Vec<Checker> {
    vec![
        check_cigar,
        check_reference_bounds,
        check_mate_fields,
        check_mate_consistency,
        check_sort_order,
        check_read_group,
    ]
}

/// Non-empty CIGAR for mapped reads, agreement with the stored bases, and
/// hard clips only at the ends.
pub fn check_cigar(record: &AlignmentRecord, ctx: &CheckContext<'_>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let cigar = &record.cigar;

    if cigar.is_empty() {
        if record.is_mapped() {
            errors.push(ValidationError::new(
                ErrorKind::EmptyCigar,
                record,
                ctx,
                "mapped read has no CIGAR",
            ));
        }
        return errors;
    }

    let read_bases = cigar.read_length();
    if record.read_length > 0 && read_bases != record.read_length {
        errors.push(ValidationError::new(
            ErrorKind::ReadLengthMismatch,
            record,
            ctx,
            format!(
                "CIGAR {cigar} covers {read_bases} bases but the read has {}",
                record.read_length
            ),
        ));
    }

    let last = cigar.len() - 1;
    if cigar
        .ops()
        .iter()
        .enumerate()
        .any(|(i, op)| op.kind() == Kind::HardClip && i != 0 && i != last)
    {
        errors.push(ValidationError::new(
            ErrorKind::HardClipNotAtEnd,
            record,
            ctx,
            format!("hard clip inside CIGAR {cigar}"),
        ));
    }

    errors
}

/// Mapped reads must sit on a known reference and inside it.
pub fn check_reference_bounds(
    record: &AlignmentRecord,
    ctx: &CheckContext<'_>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let dictionary = &ctx.header.dictionary;

    let reference = match record.reference_index {
        Some(i) => match dictionary.get(i) {
            Some(rs) => Some(rs),
            None => {
                errors.push(ValidationError::new(
                    ErrorKind::InvalidReferenceIndex,
                    record,
                    ctx,
                    format!(
                        "reference index {i} not in a dictionary of {} sequences",
                        dictionary.len()
                    ),
                ));
                return errors;
            }
        },
        None => None,
    };

    if !record.is_mapped() {
        return errors;
    }
    let Some(reference) = reference else {
        errors.push(ValidationError::new(
            ErrorKind::InvalidReferenceIndex,
            record,
            ctx,
            "mapped read has no reference sequence",
        ));
        return errors;
    };

    if record.start == 0 || record.start > reference.length {
        errors.push(ValidationError::new(
            ErrorKind::InvalidAlignmentStart,
            record,
            ctx,
            format!(
                "alignment start {} outside {} (1..={})",
                record.start, reference.name, reference.length
            ),
        ));
        return errors;
    }

    if !record.cigar.is_empty() && record.alignment_end() > reference.length {
        errors.push(ValidationError::new(
            ErrorKind::CigarMapsOffReference,
            record,
            ctx,
            format!(
                "alignment end {} past the end of {} ({})",
                record.alignment_end(),
                reference.name,
                reference.length
            ),
        ));
    }

    errors
}

/// A mapped mate must point at a known reference.
pub fn check_mate_fields(record: &AlignmentRecord, ctx: &CheckContext<'_>) -> Vec<ValidationError> {
    let flags = record.flags;
    if !flags.is_segmented() || flags.is_mate_unmapped() {
        return Vec::new();
    }
    let known = record
        .mate_reference_index
        .is_some_and(|i| ctx.header.dictionary.get(i).is_some());
    if known {
        return Vec::new();
    }
    let shown = record
        .mate_reference_index
        .map_or_else(|| "*".to_string(), |i| i.to_string());
    vec![ValidationError::new(
        ErrorKind::InvalidMateReferenceIndex,
        record,
        ctx,
        format!("mate reference index {shown} is not a known reference"),
    )]
}

/// Each half of a pair must describe the other correctly, when both are within
/// the mate window.
pub fn check_mate_consistency(
    record: &AlignmentRecord,
    ctx: &CheckContext<'_>,
) -> Vec<ValidationError> {
    let flags = record.flags;
    if !flags.is_segmented() || flags.is_secondary() || flags.is_supplementary() {
        return Vec::new();
    }
    let Some(mate) = ctx.mates.find_mate(record) else {
        return Vec::new();
    };
    let mut errors = Vec::new();

    if flags.is_mate_unmapped() != mate.unmapped {
        errors.push(ValidationError::new(
            ErrorKind::MismatchMateUnmappedFlag,
            record,
            ctx,
            format!("mate unmapped flag is {} but the mate says {}", flags.is_mate_unmapped(), mate.unmapped),
        ));
    }
    if mate.mate_unmapped != flags.is_unmapped() {
        errors.push(ValidationError::new(
            ErrorKind::MismatchMateUnmappedFlag,
            record,
            ctx,
            format!("mate records this read's unmapped flag as {}", mate.mate_unmapped),
        ));
    }

    if !mate.unmapped {
        if record.mate_reference_index != mate.reference_index {
            errors.push(ValidationError::new(
                ErrorKind::MismatchMateReferenceIndex,
                record,
                ctx,
                format!(
                    "mate reference index {:?} but the mate is on {:?}",
                    record.mate_reference_index, mate.reference_index
                ),
            ));
        }
        if record.mate_start != mate.start {
            errors.push(ValidationError::new(
                ErrorKind::MismatchMateAlignmentStart,
                record,
                ctx,
                format!(
                    "mate start {} but the mate starts at {}",
                    record.mate_start, mate.start
                ),
            ));
        }
    }

    if record.is_mapped() {
        if mate.mate_reference_index != record.reference_index {
            errors.push(ValidationError::new(
                ErrorKind::MismatchMateReferenceIndex,
                record,
                ctx,
                format!(
                    "mate records reference index {:?} for this read, which is on {:?}",
                    mate.mate_reference_index, record.reference_index
                ),
            ));
        }
        if mate.mate_start != record.start {
            errors.push(ValidationError::new(
                ErrorKind::MismatchMateAlignmentStart,
                record,
                ctx,
                format!(
                    "mate records start {} for this read, which starts at {}",
                    mate.mate_start, record.start
                ),
            ));
        }
    }

    errors
}

fn coordinate_key(record: &AlignmentRecord) -> (usize, usize) {
    // Records without a reference sort last.
    (record.reference_index.unwrap_or(usize::MAX), record.start)
}

/// Consecutive records must respect the sort order the header declares.
pub fn check_sort_order(record: &AlignmentRecord, ctx: &CheckContext<'_>) -> Vec<ValidationError> {
    let Some(previous) = ctx.previous else {
        return Vec::new();
    };
    let order = match ctx.header.sort_order {
        SortOrder::Coordinate => coordinate_key(previous).cmp(&coordinate_key(record)),
        SortOrder::QueryName => previous.name.as_bytes().cmp(record.name.as_bytes()),
        SortOrder::Unsorted | SortOrder::Unknown => return Vec::new(),
    };
    if order != Ordering::Greater {
        return Vec::new();
    }
    vec![ValidationError::new(
        ErrorKind::RecordOutOfOrder,
        record,
        ctx,
        format!(
            "record sorts before the previous record {} under {:?} order",
            previous.name, ctx.header.sort_order
        ),
    )]
}

pub fn check_read_group(record: &AlignmentRecord, ctx: &CheckContext<'_>) -> Vec<ValidationError> {
    match &record.read_group {
        None => vec![ValidationError::new(
            ErrorKind::MissingReadGroup,
            record,
            ctx,
            "record has no read group",
        )],
        Some(rg) if !ctx.header.read_groups.contains(rg) => vec![ValidationError::new(
            ErrorKind::ReadGroupNotFound,
            record,
            ctx,
            format!("read group {rg} is not declared in the header"),
        )],
        Some(_) => Vec::new(),
    }
}
