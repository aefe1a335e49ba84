//! Sample sheet loading and file id to sample id resolution.
//!
//! Sample sheets come from several exporters (GDC, hand-made manifests, ...)
//! and spell the same columns differently. Each semantic role has a static,
//! ordered list of accepted spellings; the first spelling present in the sheet
//! wins.

use std::collections::HashMap;
use std::io::Read;

use camino::Utf8Path;
use serde::Serialize;

use crate::domain::{CountFile, SampleId};
use crate::error::HarmonizeError;

const FILE_ID_SPELLINGS: &[&str] = &["file id", "file_id", "id", "uuid"];
const FILE_NAME_SPELLINGS: &[&str] = &["file name", "file_name", "filename"];
const SAMPLE_ID_SPELLINGS: &[&str] = &[
    "sample id",
    "sample_id",
    "sample submitter id",
    "sample submitter_id",
    "sample",
    "entity id",
];

#[derive(Debug, Clone, Default)]
pub struct SampleSheet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SampleSheet {
    pub fn load(path: &Utf8Path) -> Result<Self, HarmonizeError> {
        let file =
            std::fs::File::open(path.as_std_path()).map_err(|err| HarmonizeError::SampleSheetRead {
                path: path.to_string(),
                message: err.to_string(),
            })?;
        Self::from_reader(file).map_err(|err| match err {
            HarmonizeError::SampleSheetRead { message, .. } => HarmonizeError::SampleSheetRead {
                path: path.to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, HarmonizeError> {
        let sheet_error = |message: String| HarmonizeError::SampleSheetRead {
            path: "<reader>".to_string(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|err| sheet_error(err.to_string()))?
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                if idx == 0 {
                    name.trim_start_matches('\u{feff}').to_string()
                } else {
                    name.to_string()
                }
            })
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| sheet_error(err.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, `""` where a short row lacks the field.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        let idx = self.headers.iter().position(|header| header == name)?;
        Some(
            self.rows
                .iter()
                .map(move |row| row.get(idx).map(String::as_str).unwrap_or("")),
        )
    }
}

/// Columns of a sample sheet that were recognized for each role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetColumns {
    pub file_id: Option<String>,
    pub file_name: Option<String>,
    pub sample_id: Option<String>,
}

impl SheetColumns {
    pub fn detect(headers: &[String]) -> Self {
        // Like a dict keyed by the normalized name: a later duplicate shadows an earlier one.
        let normalized = headers
            .iter()
            .map(|header| (header.trim().to_lowercase(), header.clone()))
            .collect::<HashMap<_, _>>();
        let find = |spellings: &[&str]| {
            spellings
                .iter()
                .find_map(|spelling| normalized.get(*spelling).cloned())
        };

        Self {
            file_id: find(FILE_ID_SPELLINGS),
            file_name: find(FILE_NAME_SPELLINGS),
            sample_id: find(SAMPLE_ID_SPELLINGS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    FileId,
    FileName,
}

#[derive(Debug, Clone)]
pub struct IdentityCandidate {
    pub role: KeyRole,
    mapping: HashMap<String, String>,
}

impl IdentityCandidate {
    fn build(sheet: &SampleSheet, role: KeyRole, key_column: &str, sample_column: &str) -> Self {
        let mut mapping = HashMap::new();
        if let (Some(keys), Some(samples)) = (sheet.column(key_column), sheet.column(sample_column))
        {
            for (key, sample) in keys.zip(samples) {
                mapping.insert(key.to_string(), sample.to_string());
            }
        }
        Self { role, mapping }
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.mapping.get(key).map(String::as_str)
    }
}

/// Ordered lookup from file-level keys to sample ids; file id before file name.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    columns: SheetColumns,
    candidates: Vec<IdentityCandidate>,
}

impl IdentityMap {
    pub fn from_sheet(sheet: &SampleSheet) -> Self {
        let columns = SheetColumns::detect(sheet.headers());
        let mut candidates = Vec::new();

        if let Some(sample_column) = &columns.sample_id {
            if let Some(file_id_column) = &columns.file_id {
                candidates.push(IdentityCandidate::build(
                    sheet,
                    KeyRole::FileId,
                    file_id_column,
                    sample_column,
                ));
            }
            if let Some(file_name_column) = &columns.file_name {
                candidates.push(IdentityCandidate::build(
                    sheet,
                    KeyRole::FileName,
                    file_name_column,
                    sample_column,
                ));
            }
        }

        Self {
            columns,
            candidates,
        }
    }

    pub fn columns(&self) -> &SheetColumns {
        &self.columns
    }

    pub fn candidates(&self) -> &[IdentityCandidate] {
        &self.candidates
    }

    /// True when no candidate mapping could be built, so nothing will ever resolve.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn resolve(&self, key: &str) -> Option<SampleId> {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.get(key))
            .find_map(|sample| sample.parse().ok())
    }

    /// Resolve by the directory file id first, then by the file's own name.
    pub fn resolve_file(&self, file: &CountFile) -> Option<SampleId> {
        self.resolve(file.file_id.as_str())
            .or_else(|| file.file_name().and_then(|name| self.resolve(name)))
    }
}
