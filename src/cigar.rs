use anyhow::{anyhow, Result};
use std::fmt;
use std::str::FromStr;

/// CIGAR operation kinds, in BAM code order (`MIDNSHP=X`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Match = 0,
    Insertion = 1,
    Deletion = 2,
    Skip = 3,
    SoftClip = 4,
    HardClip = 5,
    Pad = 6,
    SequenceMatch = 7,
    SequenceMismatch = 8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumption {
    pub reference: bool,
    pub read: bool,
}

const fn consumes(reference: bool, read: bool) -> Consumption {
    Consumption { reference, read }
}

// Indexed by `Kind as usize`. Every length computation in the crate reads this.
const OPERATION_TABLE: [Consumption; 9] = [
    consumes(true, true),   // M
    consumes(false, true),  // I
    consumes(true, false),  // D
    consumes(true, false),  // N
    consumes(false, true),  // S
    consumes(false, false), // H
    consumes(false, false), // P
    consumes(true, true),   // =
    consumes(true, true),   // X
];

const LETTERS: [char; 9] = ['M', 'I', 'D', 'N', 'S', 'H', 'P', '=', 'X'];

const KINDS: [Kind; 9] = [
    Kind::Match,
    Kind::Insertion,
    Kind::Deletion,
    Kind::Skip,
    Kind::SoftClip,
    Kind::HardClip,
    Kind::Pad,
    Kind::SequenceMatch,
    Kind::SequenceMismatch,
];

impl Kind {
    #[inline]
    pub fn consumption(self) -> Consumption {
        OPERATION_TABLE[self as usize]
    }

    #[inline]
    pub fn consumes_reference(self) -> bool {
        self.consumption().reference
    }

    #[inline]
    pub fn consumes_read(self) -> bool {
        self.consumption().read
    }

    pub fn letter(self) -> char {
        LETTERS[self as usize]
    }

    pub fn from_letter(c: char) -> Option<Kind> {
        LETTERS.iter().position(|&l| l == c).map(|i| KINDS[i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Op {
    kind: Kind,
    len: u32,
}

impl Op {
    /// Operation lengths are positive; a zero length is rejected by every constructor
    /// that reads external input, so callers building ops by hand must respect it too.
    pub fn new(kind: Kind, len: u32) -> Self {
        debug_assert!(len > 0, "zero-length CIGAR operation");
        Self { kind, len }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub(crate) fn set_len(&mut self, len: u32) {
        self.len = len;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cigar {
    ops: Vec<Op>,
}

impl Cigar {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Read bases described by the CIGAR (M, I, S, =, X).
    pub fn read_length(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| op.kind.consumes_read())
            .map(|op| op.len as usize)
            .sum()
    }

    /// Reference positions spanned by the CIGAR (M, D, N, =, X).
    pub fn reference_length(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| op.kind.consumes_reference())
            .map(|op| op.len as usize)
            .sum()
    }
}

impl FromIterator<Op> for Cigar {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return f.write_str("*");
        }
        for op in &self.ops {
            write!(f, "{}{}", op.len, op.kind.letter())?;
        }
        Ok(())
    }
}

impl FromStr for Cigar {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "*" || s.is_empty() {
            return Ok(Cigar::default());
        }
        let mut ops = Vec::new();
        let mut len: u32 = 0;
        let mut have_digits = false;
        for c in s.chars() {
            if let Some(d) = c.to_digit(10) {
                len = len
                    .checked_mul(10)
                    .and_then(|l| l.checked_add(d))
                    .ok_or_else(|| anyhow!("CIGAR operation length overflows in {s}"))?;
                have_digits = true;
                continue;
            }
            let kind = Kind::from_letter(c)
                .ok_or_else(|| anyhow!("invalid CIGAR operation '{c}' in {s}"))?;
            if !have_digits || len == 0 {
                return Err(anyhow!("CIGAR operation '{c}' needs a positive length in {s}"));
            }
            ops.push(Op::new(kind, len));
            len = 0;
            have_digits = false;
        }
        if have_digits {
            return Err(anyhow!("CIGAR {s} ends with a length but no operation"));
        }
        Ok(Cigar { ops })
    }
}
