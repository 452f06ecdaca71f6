use crate::alignment::{AlignmentRecord, ReferenceDictionary};
use crate::clean::{clean, Cleaned, MalformedRecord};
use crate::validate::Stringency;
use anyhow::{Error, Result};

/// Downstream consumer of processed records, fed strictly in input order.
pub trait RecordSink {
    fn write_record(&mut self, record: AlignmentRecord) -> Result<()>;
}

impl RecordSink for Vec<AlignmentRecord> {
    fn write_record(&mut self, record: AlignmentRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MalformedEntry {
    /// 1-based position of the record in the input.
    pub index: u64,
    pub name: String,
    pub error: MalformedRecord,
}

#[derive(Debug, Default)]
pub struct ProcessStats {
    pub total_records: u64,
    pub unmapped_records: u64,
    pub cleaned_records: u64,
    pub clipped_bases: u64,
    pub malformed_records: u64,
    /// Malformed records reported under lenient stringency.
    pub malformed: Vec<MalformedEntry>,
}

pub struct RecordProcessor<'a> {
    dictionary: &'a ReferenceDictionary,
    stringency: Stringency,
    stats: ProcessStats,
}

impl<'a> RecordProcessor<'a> {
    pub fn new(dictionary: &'a ReferenceDictionary, stringency: Stringency) -> Self {
        Self {
            dictionary,
            stringency,
            stats: ProcessStats::default(),
        }
    }

    pub fn stats(&self) -> &ProcessStats {
        &self.stats
    }

    pub fn into_stats(self) -> ProcessStats {
        self.stats
    }

    /// Clean one record. A malformed record fails the call under strict
    /// stringency and otherwise comes back unchanged.
    pub fn process(&mut self, record: AlignmentRecord) -> Result<Cleaned> {
        self.stats.total_records += 1;
        let index = self.stats.total_records;

        if !record.is_mapped() {
            self.stats.unmapped_records += 1;
            return Ok(Cleaned::unchanged(record));
        }
        let Some(reference_length) = record
            .reference_index
            .and_then(|i| self.dictionary.get(i))
            .map(|rs| rs.length)
        else {
            tracing::debug!(record = index, name = %record.name, "no reference sequence, not cleaned");
            return Ok(Cleaned::unchanged(record));
        };
        if record.overhang(reference_length) == 0 {
            return Ok(Cleaned::unchanged(record));
        }

        match clean(record.clone(), reference_length) {
            Ok(cleaned) => {
                if cleaned.changed {
                    self.stats.cleaned_records += 1;
                }
                self.stats.clipped_bases += u64::from(cleaned.clipped);
                tracing::debug!(
                    record = index,
                    name = %cleaned.record.name,
                    from = %record.cigar,
                    to = %cleaned.record.cigar,
                    "soft-clipped alignment overhang"
                );
                Ok(cleaned)
            }
            Err(error) => {
                self.stats.malformed_records += 1;
                match self.stringency {
                    Stringency::Strict => Err(Error::new(error)
                        .context(format!("record {index} ({}) is malformed", record.name))),
                    Stringency::Lenient => {
                        tracing::warn!(record = index, name = %record.name, %error, "malformed record left unchanged");
                        self.stats.malformed.push(MalformedEntry {
                            index,
                            name: record.name.clone(),
                            error,
                        });
                        Ok(Cleaned::unchanged(record))
                    }
                    Stringency::Silent => Ok(Cleaned::unchanged(record)),
                }
            }
        }
    }

    /// Stream `records` through the cleaner into `sink`, one record at a time.
    pub fn run<I, S>(mut self, records: I, sink: &mut S) -> Result<ProcessStats>
    where
        I: IntoIterator<Item = Result<AlignmentRecord>>,
        S: RecordSink + ?Sized,
    {
        for result in records {
            let cleaned = self.process(result?)?;
            sink.write_record(cleaned.record)?;
        }
        Ok(self.stats)
    }
}
