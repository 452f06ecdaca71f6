use crate::alignment::AlignmentRecord;
use anyhow::{anyhow, Context, Result};
use noodles::{bam, sam};
use sam::alignment::RecordBuf;
use std::io::{self, BufRead, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Sam,
    Bam,
}

pub fn detect_format(path: &Path) -> Result<Format> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "sam" => Ok(Format::Sam),
        "bam" => Ok(Format::Bam),
        _ => Err(anyhow!(
            "unable to detect alignment format from extension: .{}",
            ext
        )),
    }
}

trait ReadRecordBuf {
    fn next_record(&mut self, header: &sam::Header, record: &mut RecordBuf) -> io::Result<usize>;
}

impl<R: BufRead> ReadRecordBuf for sam::io::Reader<R> {
    fn next_record(&mut self, header: &sam::Header, record: &mut RecordBuf) -> io::Result<usize> {
        self.read_record_buf(header, record)
    }
}

impl<R: Read> ReadRecordBuf for bam::io::Reader<R> {
    fn next_record(&mut self, header: &sam::Header, record: &mut RecordBuf) -> io::Result<usize> {
        self.read_record_buf(header, record)
    }
}

/// An opened SAM or BAM file, positioned after its header.
///
/// Iterating yields the decoded records in file order.
pub struct BamInput {
    pub header: sam::Header,
    reader: Box<dyn ReadRecordBuf>,
}

pub fn open_bam(path: &Path) -> Result<BamInput> {
    let (header, reader) = match detect_format(path)? {
        Format::Sam => {
            let mut reader = sam::io::reader::Builder::default()
                .build_from_path(path)
                .with_context(|| format!("failed to open SAM {}", path.display()))?;
            let header = reader.read_header()?;
            let reader: Box<dyn ReadRecordBuf> = Box::new(reader);
            (header, reader)
        }
        Format::Bam => {
            let mut reader = bam::io::reader::Builder
                .build_from_path(path)
                .with_context(|| format!("failed to open BAM {}", path.display()))?;
            let header = reader.read_header()?;
            let reader: Box<dyn ReadRecordBuf> = Box::new(reader);
            (header, reader)
        }
    };
    Ok(BamInput { header, reader })
}

impl BamInput {
    /// Decode records straight into the cleaner/validator view.
    pub fn alignment_records(self) -> impl Iterator<Item = Result<AlignmentRecord>> {
        self.map(|result| result.and_then(|record| AlignmentRecord::from_record_buf(&record)))
    }
}

impl Iterator for BamInput {
    type Item = Result<RecordBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = RecordBuf::default();
        match self.reader.next_record(&self.header, &mut record) {
            Ok(0) => None,
            Ok(_) => Some(Ok(record)),
            Err(e) => Some(Err(anyhow!("failed to decode alignment record: {e}"))),
        }
    }
}
