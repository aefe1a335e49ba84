use std::io::Read;

use crate::domain::{FormatVariant, GeneCount, coerce_count};
use crate::error::HarmonizeError;

use super::{CountParser, read_error};

/// Leading `N_unmapped`, `N_multimapping`, `N_noFeature`, `N_ambiguous` rows.
pub const RESERVED_SUMMARY_ROWS: usize = 4;

const GENE_ID_COLUMN: usize = 0;
const COUNT_COLUMN: usize = 3;

/// Headerless `gene_id gene_name gene_type count` layout written by STAR `--quantMode GeneCounts`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StarGeneCountsParser;

impl CountParser for StarGeneCountsParser {
    fn variant(&self) -> FormatVariant {
        FormatVariant::StarGeneCounts
    }

    fn parse(&self, reader: &mut dyn Read) -> Result<Vec<GeneCount>, HarmonizeError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut counts = Vec::new();
        for record in reader.records().skip(RESERVED_SUMMARY_ROWS) {
            let record = record.map_err(read_error)?;
            let gene_id = record.get(GENE_ID_COLUMN).unwrap_or("");
            if gene_id.is_empty() {
                continue;
            }
            counts.push(GeneCount {
                gene_id: gene_id.to_string(),
                raw_count: record.get(COUNT_COLUMN).map(coerce_count).unwrap_or(0.0),
            });
        }
        Ok(counts)
    }
}
