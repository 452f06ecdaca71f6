//! Soft-clipping of alignments that run past the end of their reference.
//!
//! Only the 3' end is ever touched: `start` stays put, reference-consuming
//! operations are shortened or dropped from the tail, and the read bases they
//! covered are relabelled as a single soft clip. No read base is created or lost.

use crate::alignment::AlignmentRecord;
use crate::cigar::{Cigar, Kind, Op};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    /// The CIGAR describes a different number of read bases than the record stores.
    ReadLengthMismatch { cigar: usize, sequence: usize },
    /// Clipping the overhang would leave no aligned base (the alignment starts
    /// past the reference end, or its whole span is overhang).
    NoAlignedBasesRemain { overhang: usize },
    /// A rewritten record broke one of the record invariants.
    InvariantViolated(&'static str),
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRecord::ReadLengthMismatch { cigar, sequence } => write!(
                f,
                "CIGAR covers {cigar} read bases but the record stores {sequence}"
            ),
            MalformedRecord::NoAlignedBasesRemain { overhang } => write!(
                f,
                "clipping an overhang of {overhang} leaves no aligned bases"
            ),
            MalformedRecord::InvariantViolated(what) => {
                write!(f, "cleaned record violates invariant: {what}")
            }
        }
    }
}

impl std::error::Error for MalformedRecord {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub record: AlignmentRecord,
    /// Read bases newly soft-clipped. Can be 0 on a changed record when the
    /// overhang was a trailing deletion or skip.
    pub clipped: u32,
    /// The CIGAR was rewritten.
    pub changed: bool,
}

impl Cleaned {
    pub(crate) fn unchanged(record: AlignmentRecord) -> Self {
        Self {
            record,
            clipped: 0,
            changed: false,
        }
    }
}

/// Clip whatever part of `record` lies beyond `reference_length`.
///
/// Unmapped records and records that fit are returned as they came in.
pub fn clean(
    mut record: AlignmentRecord,
    reference_length: usize,
) -> Result<Cleaned, MalformedRecord> {
    if !record.is_mapped() {
        return Ok(Cleaned::unchanged(record));
    }
    let overhang = record.overhang(reference_length);
    if overhang == 0 {
        return Ok(Cleaned::unchanged(record));
    }

    let read_bases = record.cigar.read_length();
    if record.read_length > 0 && read_bases != record.read_length {
        return Err(MalformedRecord::ReadLengthMismatch {
            cigar: read_bases,
            sequence: record.read_length,
        });
    }
    if record.start > reference_length {
        return Err(MalformedRecord::NoAlignedBasesRemain { overhang });
    }

    let (cigar, clipped) = clip_tail(&record.cigar, overhang)?;

    if cigar.read_length() != read_bases {
        return Err(MalformedRecord::InvariantViolated("read length changed"));
    }
    record.cigar = cigar;
    if record.alignment_end() > reference_length {
        return Err(MalformedRecord::InvariantViolated(
            "alignment still ends past the reference",
        ));
    }

    Ok(Cleaned {
        record,
        clipped,
        changed: true,
    })
}

/// Remove `overhang` reference positions from the end of `cigar`.
///
/// Non-reference operations after the last reference-consuming one (trailing
/// insertions, clips, padding) are kept as they are. The new soft clip goes
/// right before them and absorbs an existing soft clip it touches, so a trailing
/// insertion ends up outside the clip (`99M1I` can become `98M1S1I`). SAM wants
/// soft clips outermost apart from hard clips, and stricter validators reject
/// that shape. Returns the new CIGAR and the number of read bases moved into
/// the clip.
pub fn clip_tail(cigar: &Cigar, overhang: usize) -> Result<(Cigar, u32), MalformedRecord> {
    let ops = cigar.ops();
    let tail_start = ops
        .iter()
        .rposition(|op| op.kind().consumes_reference())
        .map_or(0, |i| i + 1);
    let (body, tail) = ops.split_at(tail_start);

    let mut kept: Vec<Op> = body.to_vec();
    let mut remaining = overhang;
    let mut clip: usize = 0;
    // Read bases of ops sitting between trimmed reference ops.
    let mut interior: usize = 0;

    while remaining > 0 {
        let Some(mut op) = kept.pop() else {
            return Err(MalformedRecord::NoAlignedBasesRemain { overhang });
        };
        let len = op.len() as usize;
        let consumption = op.kind().consumption();
        match (consumption.reference, consumption.read) {
            (true, true) => {
                let take = len.min(remaining);
                remaining -= take;
                clip += take;
                if take < len {
                    op.set_len((len - take) as u32);
                    kept.push(op);
                }
            }
            // A deletion straddling the boundary goes as a whole.
            (true, false) => remaining = remaining.saturating_sub(len),
            (false, true) => interior += len,
            (false, false) => {}
        }
    }
    clip += interior;

    // A deletion or skip cannot sit next to the clip.
    while kept
        .last()
        .is_some_and(|op| op.kind().consumes_reference() && !op.kind().consumes_read())
    {
        kept.pop();
    }
    if !kept
        .iter()
        .any(|op| op.kind().consumes_reference() && op.kind().consumes_read())
    {
        return Err(MalformedRecord::NoAlignedBasesRemain { overhang });
    }

    let clipped = u32::try_from(clip)
        .map_err(|_| MalformedRecord::InvariantViolated("soft clip length overflows"))?;
    let mut tail = tail.iter().copied().peekable();
    if clipped > 0 {
        let merged = match tail.next_if(|op| op.kind() == Kind::SoftClip) {
            Some(existing) => existing
                .len()
                .checked_add(clipped)
                .ok_or(MalformedRecord::InvariantViolated("soft clip length overflows"))?,
            None => clipped,
        };
        kept.push(Op::new(Kind::SoftClip, merged));
    }
    kept.extend(tail);

    Ok((Cigar::new(kept), clipped))
}
