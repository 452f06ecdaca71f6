/// End-to-end tests: write a small SAM, clean it (through the library and through
/// the binary), and check the CIGARs and the validation outcome.
use cleansam_rs::pipeline::{self, RunOptions};
use cleansam_rs::{ErrorKind, Stringency, ValidationConfig};
use std::path::{Path, PathBuf};
use std::process::Command;

// ── helpers ──────────────────────────────────────────────────────────────────

/// (name, reference, start, cigar, read length, expected cigar after cleaning)
const FIXTURES: &[(&str, &str, usize, &str, usize, &str)] = &[
    ("simple_fits", "chr1", 2, "100M", 100, "100M"),
    ("simple_overhang", "chr1", 3, "100M", 100, "99M1S"),
    ("fits_with_deletion", "chr2", 1, "91M2D9M", 100, "91M2D9M"),
    ("overhang_with_deletion", "chr1", 1, "91M2D9M", 100, "91M2D8M1S"),
    ("trailing_insertion", "chr1", 3, "99M1I", 100, "99M1I"),
    ("long_trailing_insertion", "chr1", 3, "90M10I", 100, "90M10I"),
    ("overhang_in_deletion", "chr3", 1, "50M10D", 50, "50M"),
];

fn sam_line(name: &str, reference: &str, start: usize, cigar: &str, len: usize) -> String {
    format!(
        "{name}\t0\t{reference}\t{start}\t60\t{cigar}\t*\t0\t0\t{}\t{}\n",
        "A".repeat(len),
        "I".repeat(len)
    )
}

fn write_fixture_sam(path: &Path, extra: &[String]) {
    let mut sam = String::from("@HD\tVN:1.6\tSO:unsorted\n@SQ\tSN:chr1\tLN:101\n@SQ\tSN:chr2\tLN:102\n@SQ\tSN:chr3\tLN:55\n");
    for (name, reference, start, cigar, len, _) in FIXTURES {
        sam.push_str(&sam_line(name, reference, *start, cigar, *len));
    }
    for line in extra {
        sam.push_str(line);
    }
    std::fs::write(path, sam).expect("write fixture SAM");
}

/// (read name, CIGAR) pairs from a SAM file.
fn read_cigars(path: &Path) -> Vec<(String, String)> {
    std::fs::read_to_string(path)
        .expect("read output SAM")
        .lines()
        .filter(|line| !line.starts_with('@'))
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            (fields[0].to_string(), fields[5].to_string())
        })
        .collect()
}

fn cleansam_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cleansam-rs"))
}

fn run_binary(input: &Path, output: &Path, extra_args: &[&str]) -> bool {
    Command::new(cleansam_bin())
        .arg(input)
        .arg("-o")
        .arg(output)
        .arg("-q")
        .args(extra_args)
        .status()
        .expect("failed to spawn cleansam-rs")
        .success()
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[test]
fn library_run_cleans_and_validates_sam() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.sam");
    let output = dir.path().join("cleaned.sam");
    write_fixture_sam(&input, &[]);

    let summary = pipeline::run(&RunOptions {
        input: input.clone(),
        output: output.clone(),
        stringency: Stringency::Lenient,
        validation: Some(ValidationConfig {
            ignored: [ErrorKind::MissingReadGroup].into_iter().collect(),
            ..Default::default()
        }),
    })
    .unwrap();

    assert!(summary.success());
    assert_eq!(summary.stats.total_records, FIXTURES.len() as u64);
    assert_eq!(summary.stats.cleaned_records, 3);
    assert_eq!(summary.stats.clipped_bases, 2);
    let report = summary.report.unwrap();
    assert_eq!(report.records_checked, FIXTURES.len() as u64);
    assert_eq!(report.ignored, FIXTURES.len() as u64);

    let got = read_cigars(&output);
    for ((name, cigar), fixture) in got.iter().zip(FIXTURES) {
        assert_eq!(name, fixture.0);
        assert_eq!(cigar, fixture.5, "{name}");
    }
}

/// Before cleaning, the overhanging fixtures fail validation.
#[test]
fn uncleaned_input_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.sam");
    write_fixture_sam(&input, &[]);

    let report = pipeline::validate_file(&input, ValidationConfig::default()).unwrap();
    assert!(!report.success());
    assert_eq!(report.count(ErrorKind::CigarMapsOffReference), 3);
}

#[test]
fn bam_output_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.sam");
    let output = dir.path().join("cleaned.bam");
    write_fixture_sam(&input, &[]);

    let summary = pipeline::run(&RunOptions {
        input,
        output: output.clone(),
        stringency: Stringency::Strict,
        validation: Some(ValidationConfig::default()),
    })
    .unwrap();
    assert!(summary.success());

    let report = pipeline::validate_file(&output, ValidationConfig::default()).unwrap();
    assert_eq!(report.errors, 0);
    assert_eq!(report.count(ErrorKind::MissingReadGroup), FIXTURES.len() as u64);
}

#[test]
fn binary_exits_zero_on_clean_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.sam");
    let output = dir.path().join("cleaned.sam");
    write_fixture_sam(&input, &[]);

    assert!(run_binary(&input, &output, &["--ignore", "MISSING_READ_GROUP"]));
    let got = read_cigars(&output);
    assert_eq!(got.len(), FIXTURES.len());
    assert_eq!(got[1].1, "99M1S");
    assert_eq!(got[6].1, "50M");
}

#[test]
fn binary_fails_on_malformed_record() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.sam");
    let output = dir.path().join("cleaned.sam");
    let past_end = sam_line("past_end", "chr1", 120, "10M", 10);
    write_fixture_sam(&input, &[past_end]);

    assert!(!run_binary(&input, &output, &["--stringency", "lenient"]));
    assert!(!run_binary(&input, &output, &["--stringency", "strict", "--no-validate"]));
}

#[test]
fn binary_fails_on_unreadable_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.sam");
    let output = dir.path().join("cleaned.sam");
    assert!(!run_binary(&missing, &output, &[]));
}
