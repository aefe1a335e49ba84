//! Destinations for the merged count table.
//!
//! The relational store is owned by whoever runs the load; this crate only needs
//! "replace table `name` with these rows". [`TsvDirectorySink`] implements that
//! contract with one file per table so the binary works without a database.

use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::error::HarmonizeError;
use crate::table::MergedCountTable;

pub const DEFAULT_TABLE: &str = "rna_counts_raw";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkReport {
    pub table: String,
    pub rows: usize,
    pub samples: usize,
    pub location: Option<String>,
}

pub trait CountSink {
    /// Drop any existing table of the same name and load `table` in its place.
    fn replace_table(
        &self,
        name: &str,
        table: &MergedCountTable,
    ) -> Result<SinkReport, HarmonizeError>;
}

pub fn validate_table_name(name: &str) -> Result<(), HarmonizeError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !valid {
        return Err(HarmonizeError::InvalidTableName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TsvDirectorySink {
    dir: Utf8PathBuf,
}

impl TsvDirectorySink {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn table_path(&self, name: &str) -> Utf8PathBuf {
        self.dir.join(format!("{name}.tsv"))
    }
}

impl CountSink for TsvDirectorySink {
    fn replace_table(
        &self,
        name: &str,
        table: &MergedCountTable,
    ) -> Result<SinkReport, HarmonizeError> {
        validate_table_name(name)?;
        fs::create_dir_all(self.dir.as_std_path())
            .map_err(|err| HarmonizeError::Filesystem(err.to_string()))?;

        let dest = self.table_path(name);
        let mut temp = tempfile::Builder::new()
            .prefix("count-harmonizer-table")
            .tempfile_in(self.dir.as_std_path())
            .map_err(|err| HarmonizeError::Filesystem(err.to_string()))?;
        table.write_tsv(temp.as_file_mut())?;
        temp.persist(dest.as_std_path())
            .map_err(|err| HarmonizeError::Sink(err.to_string()))?;

        Ok(SinkReport {
            table: name.to_string(),
            rows: table.len(),
            samples: table.sample_count(),
            location: Some(dest.to_string()),
        })
    }
}

/// Keeps the last table loaded under each name.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Mutex<HashMap<String, MergedCountTable>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Result<Option<MergedCountTable>, HarmonizeError> {
        let tables = self.tables.lock().map_err(|_| poisoned())?;
        Ok(tables.get(name).cloned())
    }
}

impl CountSink for MemorySink {
    fn replace_table(
        &self,
        name: &str,
        table: &MergedCountTable,
    ) -> Result<SinkReport, HarmonizeError> {
        validate_table_name(name)?;
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| poisoned())?;
        tables.insert(name.to_string(), table.clone());
        Ok(SinkReport {
            table: name.to_string(),
            rows: table.len(),
            samples: table.sample_count(),
            location: None,
        })
    }
}

fn poisoned() -> HarmonizeError {
    HarmonizeError::Sink("memory sink poisoned".to_string())
}
