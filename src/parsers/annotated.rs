use std::io::Read;

use crate::domain::{FormatVariant, GeneCount, coerce_count, is_missing, is_numeric, is_summary_gene};
use crate::error::HarmonizeError;

use super::{CountParser, read_error};

const GENE_COLUMN_NAMES: &[&str] = &[
    "ensembl_gene_id",
    "gene_id",
    "ensemblgeneid",
    "geneid",
    "gene",
];

/// Tried in this order; the first name present wins even if it comes later in the header.
const COUNT_COLUMN_NAMES: &[&str] = &["unstranded", "raw_count", "count", "htseq_counts", "counts"];

/// Headered count table (HTSeq output, GDC augmented STAR tables, ...) with a `#` preamble.
#[derive(Debug, Clone, Copy)]
pub struct AnnotatedTableParser {
    pub comment_prefix: u8,
}

impl CountParser for AnnotatedTableParser {
    fn variant(&self) -> FormatVariant {
        FormatVariant::AnnotatedTable
    }

    fn parse(&self, reader: &mut dyn Read) -> Result<Vec<GeneCount>, HarmonizeError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(self.comment_prefix))
            .from_reader(reader);

        let mut records = reader.records();
        let header = records
            .next()
            .ok_or_else(|| HarmonizeError::EmptyCountFile("<reader>".to_string()))?
            .map_err(read_error)?;
        let columns = header.iter().map(|name| name.trim().to_string()).collect::<Vec<_>>();
        let rows = records
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_error)?;

        let gene_idx = gene_column(&columns).unwrap_or(0);
        let count_idx = count_column(&columns)
            .or_else(|| fallback_count_column(&columns, &rows))
            .ok_or(HarmonizeError::NoCountColumn)?;

        let counts = rows
            .iter()
            .filter_map(|row| {
                let gene_id = row.get(gene_idx).unwrap_or("");
                if gene_id.is_empty() || is_summary_gene(gene_id) {
                    return None;
                }
                Some(GeneCount {
                    gene_id: gene_id.to_string(),
                    raw_count: coerce_count(row.get(count_idx).unwrap_or("")),
                })
            })
            .collect();
        Ok(counts)
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

fn gene_column(columns: &[String]) -> Option<usize> {
    columns
        .iter()
        .position(|column| GENE_COLUMN_NAMES.contains(&normalize(column).as_str()))
}

fn count_column(columns: &[String]) -> Option<usize> {
    COUNT_COLUMN_NAMES.iter().find_map(|name| {
        columns
            .iter()
            .position(|column| normalize(column) == *name)
    })
}

/// First all-numeric column that is not a feature length. Missing markers do not
/// disqualify a column.
fn fallback_count_column(columns: &[String], rows: &[csv::StringRecord]) -> Option<usize> {
    if rows.is_empty() {
        return None;
    }
    columns.iter().enumerate().find_map(|(idx, column)| {
        let numeric = rows.iter().all(|row| {
            let value = row.get(idx).unwrap_or("");
            is_missing(value) || is_numeric(value)
        });
        (numeric && !column.to_lowercase().contains("length")).then_some(idx)
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn parse(text: &str) -> Result<Vec<GeneCount>, HarmonizeError> {
        AnnotatedTableParser {
            comment_prefix: b'#',
        }
        .parse(&mut text.as_bytes())
    }

    fn genes(counts: &[GeneCount]) -> Vec<&str> {
        counts.iter().map(|count| count.gene_id.as_str()).collect()
    }

    #[test]
    fn gdc_augmented_table_uses_unstranded() {
        let text = "# gene-model: GENCODE v36\n\
gene_id\tgene_name\tgene_type\tunstranded\tstranded_first\tstranded_second\ttpm_unstranded\n\
N_unmapped\t\t\t100\t100\t100\t\n\
N_multimapping\t\t\t20\t20\t20\t\n\
ENSG00000000003.15\tTSPAN6\tprotein_coding\t2231\t1115\t1116\t30.1\n\
ENSG00000000005.6\tTNMD\tprotein_coding\t3\t1\t2\t0.1\n";
        let counts = parse(text).unwrap();
        assert_eq!(genes(&counts), vec!["ENSG00000000003.15", "ENSG00000000005.6"]);
        assert_eq!(counts[0].raw_count, 2231.0);
    }

    #[test]
    fn count_priority_beats_header_order() {
        let text = "gene\tcounts\traw_count\nENSG1\t1\t7\n";
        assert_eq!(parse(text).unwrap()[0].raw_count, 7.0);
    }

    #[test]
    fn header_names_are_trimmed_and_space_insensitive() {
        let text = " Ensembl Gene ID \t Raw Count \nENSG1\t5\n";
        let counts = parse(text).unwrap();
        assert_eq!(genes(&counts), vec!["ENSG1"]);
        assert_eq!(counts[0].raw_count, 5.0);
    }

    #[test]
    fn htseq_summary_rows_are_dropped() {
        let text = "gene_id\tcount\nENSG1\t4\n__no_feature\t10\n__ambiguous\t2\nN_noFeature\t1\n";
        assert_eq!(genes(&parse(text).unwrap()), vec!["ENSG1"]);
    }

    #[test]
    fn fallback_skips_length_columns() {
        let text = "feature\tlength\treads\nENSG1\t1500\t42\nENSG2\t900\t\n";
        let counts = parse(text).unwrap();
        assert_eq!(genes(&counts), vec!["ENSG1", "ENSG2"]);
        assert_eq!(counts[0].raw_count, 42.0);
        assert_eq!(counts[1].raw_count, 0.0);
    }

    #[test]
    fn fallback_tolerates_missing_markers() {
        let text = "feature\treads\nENSG1\t5\nENSG2\tNA\nENSG3\tnull\n";
        let counts = parse(text).unwrap();
        assert_eq!(genes(&counts), vec!["ENSG1", "ENSG2", "ENSG3"]);
        assert_eq!(counts[0].raw_count, 5.0);
        assert_eq!(counts[1].raw_count, 0.0);
        assert_eq!(counts[2].raw_count, 0.0);
    }

    #[test]
    fn gene_column_falls_back_to_first_column() {
        let text = "name\tcount\nENSG1\t3\n";
        assert_eq!(genes(&parse(text).unwrap()), vec!["ENSG1"]);
    }

    #[test]
    fn non_numeric_counts_become_zero() {
        let text = "gene_id\tcount\nENSG1\tNA\nENSG2\t8\n";
        let counts = parse(text).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].raw_count, 0.0);
    }

    #[test]
    fn no_count_column_is_an_error() {
        let text = "gene_id\tgene_name\tgene_length\nENSG1\tA\t100\n";
        assert_matches!(parse(text), Err(HarmonizeError::NoCountColumn));
    }

    #[test]
    fn missing_header_is_an_error() {
        assert_matches!(parse("# only a comment\n"), Err(HarmonizeError::EmptyCountFile(_)));
    }
}
