use cleansam_rs::{clean, AlignmentRecord, Cigar, Kind, MalformedRecord};
use noodles::sam::alignment::record::Flags;

fn record(cigar: &str, start: usize) -> AlignmentRecord {
    let cigar: Cigar = cigar.parse().unwrap();
    AlignmentRecord {
        name: "read1".to_string(),
        reference_index: Some(0),
        start,
        read_length: cigar.read_length(),
        cigar,
        ..Default::default()
    }
}

fn cleaned_cigar(cigar: &str, start: usize, reference_length: usize) -> String {
    clean(record(cigar, start), reference_length)
        .unwrap()
        .record
        .cigar
        .to_string()
}

#[test]
fn fitting_alignment_is_unchanged() {
    let input = record("100M", 1);
    let cleaned = clean(input.clone(), 100).unwrap();
    assert_eq!(cleaned.record, input);
    assert_eq!(cleaned.clipped, 0);
    assert!(!cleaned.changed);
}

#[test]
fn one_base_overhang_becomes_soft_clip() {
    let cleaned = clean(record("100M", 2), 100).unwrap();
    assert_eq!(cleaned.record.cigar.to_string(), "99M1S");
    assert_eq!(cleaned.record.start, 2);
    assert_eq!(cleaned.clipped, 1);
}

#[test]
fn deletion_that_fits_is_unchanged() {
    assert_eq!(cleaned_cigar("91M2D9M", 1, 102), "91M2D9M");
}

/// The deletion lies before the boundary; only the last match run shrinks.
#[test]
fn overhang_after_deletion_shrinks_final_match() {
    assert_eq!(cleaned_cigar("91M2D9M", 1, 101), "91M2D8M1S");
}

#[test]
fn trailing_insertion_does_not_consume_reference() {
    assert_eq!(cleaned_cigar("99M1I", 1, 100), "99M1I");
}

#[test]
fn long_trailing_insertion_does_not_consume_reference() {
    assert_eq!(cleaned_cigar("90M10I", 1, 100), "90M10I");
    assert_eq!(cleaned_cigar("90M10I", 11, 100), "90M10I");
}

/// A trailing insertion keeps its length when the alignment in front of it is clipped.
#[test]
fn trailing_insertion_survives_clipping() {
    for ins in [1u32, 5, 40] {
        let input = format!("99M{ins}I");
        let cleaned = clean(record(&input, 3), 100).unwrap();
        let ops = cleaned.record.cigar.ops().to_vec();
        let last = ops.last().unwrap();
        assert_eq!(last.kind(), Kind::Insertion, "{input}");
        assert_eq!(last.len(), ins, "{input}");
        assert_eq!(cleaned.record.cigar.to_string(), format!("98M1S{ins}I"));
    }
}

#[test]
fn existing_soft_clip_is_merged() {
    assert_eq!(cleaned_cigar("95M5S", 7, 100), "94M6S");
}

#[test]
fn hard_clips_stay_outermost() {
    assert_eq!(cleaned_cigar("5H100M5H", 2, 100), "5H99M1S5H");
    assert_eq!(cleaned_cigar("100M3S5H", 2, 100), "99M4S5H");
}

#[test]
fn match_runs_are_dropped_whole_when_fully_overhanging() {
    assert_eq!(cleaned_cigar("50M10=10X", 41, 100), "50M10=10S");
    assert_eq!(cleaned_cigar("50M10=10X", 46, 100), "50M5=15S");
}

/// Overhang of 4: the 2M goes, then the 3D straddles the boundary and goes whole.
#[test]
fn deletion_straddling_boundary_is_dropped() {
    let cleaned = clean(record("90M3D2M", 10), 100).unwrap();
    assert_eq!(cleaned.record.cigar.to_string(), "90M2S");
    assert_eq!(cleaned.record.alignment_end(), 99);
}

/// The whole overhang sits inside a trailing deletion: no read base moves into
/// a clip, but the CIGAR still changes.
#[test]
fn overhang_inside_trailing_deletion_drops_it() {
    let cleaned = clean(record("50M10D", 1), 55).unwrap();
    assert_eq!(cleaned.record.cigar.to_string(), "50M");
    assert_eq!(cleaned.record.alignment_end(), 50);
    assert_eq!(cleaned.clipped, 0);
    assert!(cleaned.changed);
}

#[test]
fn deletion_left_next_to_clip_is_dropped() {
    assert_eq!(cleaned_cigar("90M3D5M", 8, 100), "90M5S");
    assert_eq!(cleaned_cigar("90M2N5M", 9, 100), "90M5S");
}

#[test]
fn insertion_inside_clipped_span_joins_clip() {
    assert_eq!(cleaned_cigar("90M2I5M", 8, 100), "90M2I3M2S");
    assert_eq!(cleaned_cigar("90M2I5M", 12, 100), "89M8S");
}

#[test]
fn alignment_starting_past_reference_is_malformed() {
    let err = clean(record("10M", 101), 100).unwrap_err();
    assert_eq!(err, MalformedRecord::NoAlignedBasesRemain { overhang: 10 });
}

#[test]
fn alignment_with_nothing_left_to_keep_is_malformed() {
    let err = clean(record("5S4D2M", 99), 100).unwrap_err();
    assert!(matches!(err, MalformedRecord::NoAlignedBasesRemain { .. }), "{err}");
}

#[test]
fn read_length_mismatch_is_malformed() {
    let mut input = record("100M", 2);
    input.read_length = 90;
    let err = clean(input, 100).unwrap_err();
    assert_eq!(
        err,
        MalformedRecord::ReadLengthMismatch {
            cigar: 100,
            sequence: 90
        }
    );
}

#[test]
fn record_without_bases_is_still_cleaned() {
    let mut input = record("100M", 2);
    input.read_length = 0;
    let cleaned = clean(input, 100).unwrap();
    assert_eq!(cleaned.record.cigar.to_string(), "99M1S");
    assert_eq!(cleaned.record.read_length, 0);
}

#[test]
fn unmapped_record_is_left_alone() {
    let mut input = record("100M", 50);
    input.flags = Flags::UNMAPPED;
    let cleaned = clean(input.clone(), 100).unwrap();
    assert_eq!(cleaned.record, input);
}

const CASES: &[(&str, usize)] = &[
    ("100M", 1),
    ("100M", 2),
    ("100M", 31),
    ("91M2D9M", 1),
    ("99M1I", 3),
    ("90M10I", 20),
    ("5S90M5S", 15),
    ("3H20M1I20M2D20M3S", 70),
    ("40=1X40=", 25),
    ("30M500N30M", 1),
];

#[test]
fn cleaning_preserves_read_length_and_fits_reference() {
    for &(cigar, start) in CASES {
        let input = record(cigar, start);
        let Ok(cleaned) = clean(input.clone(), 100) else {
            continue;
        };
        let out = &cleaned.record;
        assert_eq!(out.cigar.read_length(), input.cigar.read_length(), "{cigar} @ {start}");
        assert_eq!(out.read_length, input.read_length, "{cigar} @ {start}");
        assert_eq!(out.start, input.start, "{cigar} @ {start}");
        assert!(out.alignment_end() <= 100, "{cigar} @ {start} -> {}", out.cigar);
        assert!(!out.cigar.is_empty());
    }
}

#[test]
fn cleaning_is_idempotent() {
    for &(cigar, start) in CASES {
        let Ok(once) = clean(record(cigar, start), 100) else {
            continue;
        };
        let twice = clean(once.record.clone(), 100).unwrap();
        assert_eq!(twice.record, once.record, "{cigar} @ {start}");
        assert_eq!(twice.clipped, 0);
        assert!(!twice.changed);
    }
}
