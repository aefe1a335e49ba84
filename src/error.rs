use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarmonizeError {
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("invalid format variant: {0}")]
    InvalidFormatVariant(String),

    #[error("count file has no parent directory to take a file id from: {0}")]
    MissingFileId(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("invalid setting {name}: {message}")]
    InvalidSetting { name: &'static str, message: String },

    #[error("failed to read sample sheet {path}: {message}")]
    SampleSheetRead { path: String, message: String },

    #[error("count root not found: {0}")]
    RootNotFound(String),

    #[error("failed to read count file {path}: {message}")]
    CountFileRead { path: String, message: String },

    #[error("count file has no header row: {0}")]
    EmptyCountFile(String),

    #[error("no suitable count column found")]
    NoCountColumn,

    #[error("no rows collected; check the file id to sample mapping and file patterns")]
    #[diagnostic(help(
        "every count file was either unmapped or failed to parse; verify --root and the sample sheet columns"
    ))]
    NoDataCollected,

    #[error("invalid table name: {0}")]
    InvalidTableName(String),

    #[error("sink write failed: {0}")]
    Sink(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
