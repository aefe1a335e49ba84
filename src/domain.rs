use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::HarmonizeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FileId {
    type Err = HarmonizeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if normalized.is_empty() {
            return Err(HarmonizeError::InvalidIdentifier(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SampleId {
    type Err = HarmonizeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if normalized.is_empty() {
            return Err(HarmonizeError::InvalidIdentifier(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

/// Structural layout of a count file, as classified by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum FormatVariant {
    /// Headerless four-column aligner output led by `N_` summary rows.
    StarGeneCounts,
    /// Headered table with an optional `#` preamble and arbitrary columns.
    AnnotatedTable,
}

impl fmt::Display for FormatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatVariant::StarGeneCounts => write!(f, "star_gene_counts"),
            FormatVariant::AnnotatedTable => write!(f, "annotated_table"),
        }
    }
}

impl FromStr for FormatVariant {
    type Err = HarmonizeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "star_gene_counts" | "star" => Ok(FormatVariant::StarGeneCounts),
            "annotated_table" | "annotated" | "htseq" => Ok(FormatVariant::AnnotatedTable),
            _ => Err(HarmonizeError::InvalidFormatVariant(value.to_string())),
        }
    }
}

/// A count file on disk together with the file id of its directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountFile {
    pub path: Utf8PathBuf,
    pub file_id: FileId,
}

impl CountFile {
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Result<Self, HarmonizeError> {
        let path = path.into();
        let file_id: FileId = path
            .parent()
            .and_then(Utf8Path::file_name)
            .ok_or_else(|| HarmonizeError::MissingFileId(path.to_string()))?
            .parse()
            .map_err(|_| HarmonizeError::MissingFileId(path.to_string()))?;
        Ok(Self { path, file_id })
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }
}

/// One parsed row before it is tagged with a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneCount {
    pub gene_id: String,
    pub raw_count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalCountRecord {
    pub sample_id: SampleId,
    #[serde(rename = "ensembl_gene_id")]
    pub gene_id: String,
    #[serde(serialize_with = "serialize_count")]
    pub raw_count: f64,
}

impl CanonicalCountRecord {
    pub fn tagged(sample_id: &SampleId, count: GeneCount) -> Self {
        Self {
            sample_id: sample_id.clone(),
            gene_id: count.gene_id,
            raw_count: count.raw_count,
        }
    }
}

// 2^53: largest range in which every integer is exact in an f64.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

fn serialize_count<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && *value < EXACT_INTEGER_LIMIT {
        serializer.serialize_u64(*value as u64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Lenient count coercion: anything that is not a finite, non-negative number becomes zero.
pub fn coerce_count(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() && number >= 0.0 => number,
        _ => 0.0,
    }
}

pub fn is_numeric(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

/// Tokens that tabular tooling conventionally reads as an absent value.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value.trim())
}

/// Summary rows (`__no_feature`, `N_unmapped`, ...) are bookkeeping, not genes.
pub fn is_summary_gene(gene_id: &str) -> bool {
    gene_id.starts_with("__") || gene_id.starts_with("N_")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn coerce_count_is_lenient() {
        assert_eq!(coerce_count("10"), 10.0);
        assert_eq!(coerce_count(" 2.5 "), 2.5);
        assert_eq!(coerce_count("not_a_number"), 0.0);
        assert_eq!(coerce_count(""), 0.0);
        assert_eq!(coerce_count("NaN"), 0.0);
        assert_eq!(coerce_count("-3"), 0.0);
    }

    #[test]
    fn missing_markers_are_recognized() {
        for value in ["", " NA ", "N/A", "NULL", "None", "nan", "n/a", "null", "#N/A"] {
            assert!(is_missing(value), "{value:?}");
        }
        assert!(!is_missing("0"));
        assert!(!is_missing("na_value"));
    }

    #[test]
    fn count_file_takes_parent_directory_as_file_id() {
        let file = CountFile::from_path("/data/uuid-1/counts.tsv").unwrap();
        assert_eq!(file.file_id.as_str(), "uuid-1");
        assert_eq!(file.file_name(), Some("counts.tsv"));
    }

    #[test]
    fn count_file_without_directory_is_rejected() {
        let err = CountFile::from_path("counts.tsv").unwrap_err();
        assert_matches!(err, HarmonizeError::MissingFileId(_));
    }
}
