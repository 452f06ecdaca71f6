use crate::cigar::{Cigar, Kind, Op};
use anyhow::{anyhow, Result};
use noodles::sam;
use sam::alignment::record::cigar::{op::Kind as SamKind, Op as SamOp};
use sam::alignment::record::data::field::Tag;
use sam::alignment::record::Flags;
use sam::alignment::record_buf::{data::field::Value, Cigar as SamCigar};
use sam::alignment::RecordBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSequence {
    pub name: String,
    pub length: usize,
}

/// Reference sequences addressed by their 0-based index in the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceDictionary {
    sequences: Vec<ReferenceSequence>,
}

impl ReferenceDictionary {
    pub fn new(sequences: Vec<ReferenceSequence>) -> Self {
        Self { sequences }
    }

    pub fn get(&self, index: usize) -> Option<&ReferenceSequence> {
        self.sequences.get(index)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceSequence> {
        self.sequences.iter()
    }
}

/// The fields of an alignment record that cleaning and validation look at.
///
/// Positions are 1-based; `start == 0` means the record has no position
/// (`POS = 0` in SAM). `read_length == 0` means the record stores no bases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub name: String,
    pub flags: Flags,
    pub reference_index: Option<usize>,
    pub start: usize,
    pub cigar: Cigar,
    pub read_length: usize,
    pub mate_reference_index: Option<usize>,
    pub mate_start: usize,
    pub read_group: Option<String>,
}

impl AlignmentRecord {
    pub fn is_mapped(&self) -> bool {
        !self.flags.is_unmapped()
    }

    /// Last reference position covered, `start + ref_len - 1`.
    ///
    /// An alignment that consumes no reference ends one before it starts.
    pub fn alignment_end(&self) -> usize {
        (self.start + self.cigar.reference_length()).saturating_sub(1)
    }

    /// Positions past `reference_length` that the alignment covers, or 0.
    pub fn overhang(&self, reference_length: usize) -> usize {
        self.alignment_end().saturating_sub(reference_length)
    }

    pub fn from_record_buf(record: &RecordBuf) -> Result<Self> {
        let name = record.name().map(|n| n.to_string()).unwrap_or_default();
        let cigar = cigar_from_sam(record.cigar().as_ref())
            .map_err(|e| anyhow!("record {name}: {e}"))?;
        let read_group = match record.data().get(&Tag::READ_GROUP) {
            Some(Value::String(rg)) => Some(rg.to_string()),
            Some(_) => return Err(anyhow!("record {name}: RG tag is not a string")),
            None => None,
        };

        Ok(Self {
            flags: record.flags(),
            reference_index: record.reference_sequence_id(),
            start: record.alignment_start().map(|p| p.get()).unwrap_or(0),
            cigar,
            read_length: record.sequence().len(),
            mate_reference_index: record.mate_reference_sequence_id(),
            mate_start: record.mate_alignment_start().map(|p| p.get()).unwrap_or(0),
            read_group,
            name,
        })
    }
}

fn kind_from_sam(kind: SamKind) -> Kind {
    match kind {
        SamKind::Match => Kind::Match,
        SamKind::Insertion => Kind::Insertion,
        SamKind::Deletion => Kind::Deletion,
        SamKind::Skip => Kind::Skip,
        SamKind::SoftClip => Kind::SoftClip,
        SamKind::HardClip => Kind::HardClip,
        SamKind::Pad => Kind::Pad,
        SamKind::SequenceMatch => Kind::SequenceMatch,
        SamKind::SequenceMismatch => Kind::SequenceMismatch,
    }
}

fn kind_to_sam(kind: Kind) -> SamKind {
    match kind {
        Kind::Match => SamKind::Match,
        Kind::Insertion => SamKind::Insertion,
        Kind::Deletion => SamKind::Deletion,
        Kind::Skip => SamKind::Skip,
        Kind::SoftClip => SamKind::SoftClip,
        Kind::HardClip => SamKind::HardClip,
        Kind::Pad => SamKind::Pad,
        Kind::SequenceMatch => SamKind::SequenceMatch,
        Kind::SequenceMismatch => SamKind::SequenceMismatch,
    }
}

pub fn cigar_from_sam(ops: &[SamOp]) -> Result<Cigar> {
    ops.iter()
        .map(|op| {
            let len = u32::try_from(op.len())
                .map_err(|_| anyhow!("CIGAR operation length {} out of range", op.len()))?;
            if len == 0 {
                return Err(anyhow!("zero-length CIGAR operation"));
            }
            Ok(Op::new(kind_from_sam(op.kind()), len))
        })
        .collect()
}

pub fn cigar_to_sam(cigar: &Cigar) -> SamCigar {
    cigar
        .ops()
        .iter()
        .map(|op| SamOp::new(kind_to_sam(op.kind()), op.len() as usize))
        .collect()
}
