use crate::bam_input::{detect_format, Format};
use anyhow::{Context, Result};
use noodles::{bam, sam};
use sam::alignment::RecordBuf;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// A SAM or BAM writer that has already written `header`.
pub struct BamOutput {
    header: sam::Header,
    writer: Box<dyn sam::alignment::io::Write>,
}

pub fn create_bam(path: &Path, header: &sam::Header) -> Result<BamOutput> {
    let format = detect_format(path)?;
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer: Box<dyn sam::alignment::io::Write> = match format {
        Format::Sam => Box::new(sam::io::Writer::new(BufWriter::new(file))),
        Format::Bam => Box::new(bam::io::Writer::new(file)),
    };
    writer.write_alignment_header(header)?;
    Ok(BamOutput {
        header: header.clone(),
        writer,
    })
}

impl BamOutput {
    pub fn write(&mut self, record: &RecordBuf) -> Result<()> {
        self.writer.write_alignment_record(&self.header, record)?;
        Ok(())
    }

    /// Flush buffered output (and the BGZF EOF block for BAM).
    pub fn finish(mut self) -> Result<()> {
        self.writer.finish(&self.header)?;
        Ok(())
    }
}
