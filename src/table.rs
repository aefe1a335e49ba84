use std::collections::BTreeSet;
use std::io::Write;

use crate::domain::{CanonicalCountRecord, SampleId};
use crate::error::HarmonizeError;

/// Long-format (sample, gene, raw count) rows from every loaded file, in discovery order.
///
/// Duplicate (sample, gene) pairs are kept as they arrive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedCountTable {
    records: Vec<CanonicalCountRecord>,
}

impl MergedCountTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CanonicalCountRecord] {
        &self.records
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = CanonicalCountRecord>) {
        self.records.extend(records);
    }

    pub fn samples(&self) -> BTreeSet<&SampleId> {
        self.records.iter().map(|record| &record.sample_id).collect()
    }

    pub fn sample_count(&self) -> usize {
        self.samples().len()
    }

    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<(), HarmonizeError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_writer(writer);
        if self.records.is_empty() {
            writer
                .write_record(["sample_id", "ensembl_gene_id", "raw_count"])
                .map_err(|err| HarmonizeError::Sink(err.to_string()))?;
        }
        for record in &self.records {
            writer
                .serialize(record)
                .map_err(|err| HarmonizeError::Sink(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| HarmonizeError::Sink(err.to_string()))
    }
}

impl FromIterator<CanonicalCountRecord> for MergedCountTable {
    fn from_iter<I: IntoIterator<Item = CanonicalCountRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
