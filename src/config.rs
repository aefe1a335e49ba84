use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::detect::{DEFAULT_COMMENT_PREFIX, DEFAULT_PROBE_ROWS, FormatDetector};
use crate::discovery::default_suffixes;
use crate::domain::FormatVariant;
use crate::error::HarmonizeError;
use crate::sink::{DEFAULT_TABLE, validate_table_name};

pub const DEFAULT_CONFIG_FILE: &str = "count-harmonizer.json";

/// Minimum probe: a header line plus the three summary rows that open STAR output.
const MIN_PROBE_ROWS: usize = 4;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub sample_sheet: Option<String>,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub suffixes: Option<Vec<String>>,
    #[serde(default)]
    pub comment_prefix: Option<String>,
    #[serde(default)]
    pub probe_rows: Option<usize>,
    #[serde(default)]
    pub variant: Option<FormatVariant>,
}

/// Command-line values; any `Some` wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub sample_sheet: Option<String>,
    pub root: Option<String>,
    pub output_dir: Option<String>,
    pub table: Option<String>,
    pub variant: Option<FormatVariant>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub sample_sheet: Utf8PathBuf,
    pub root: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
    pub table: String,
    pub suffixes: Vec<String>,
    pub detector: FormatDetector,
    pub variant: Option<FormatVariant>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `path` (or `count-harmonizer.json` if present) and apply overrides.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, HarmonizeError> {
        let config = Self::load(path)?;
        Self::resolve_config(config, overrides)
    }

    pub fn load(path: Option<&str>) -> Result<Config, HarmonizeError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| HarmonizeError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| HarmonizeError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, HarmonizeError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let sample_sheet = overrides
            .sample_sheet
            .or(config.sample_sheet)
            .ok_or(HarmonizeError::MissingSetting("sample_sheet"))?;
        let root = overrides
            .root
            .or(config.root)
            .ok_or(HarmonizeError::MissingSetting("root"))?;
        let output_dir = overrides
            .output_dir
            .or(config.output_dir)
            .unwrap_or_else(|| ".".to_string());

        let table = overrides
            .table
            .or(config.table)
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());
        validate_table_name(&table).map_err(|_| HarmonizeError::InvalidSetting {
            name: "table",
            message: format!("{table:?} must be non-empty and use only [A-Za-z0-9_]"),
        })?;

        let suffixes = config.suffixes.unwrap_or_else(default_suffixes);
        if suffixes.is_empty() || suffixes.iter().any(|suffix| suffix.is_empty()) {
            return Err(HarmonizeError::InvalidSetting {
                name: "suffixes",
                message: "at least one non-empty suffix is required".to_string(),
            });
        }

        let comment_prefix = match config.comment_prefix.as_deref() {
            None => DEFAULT_COMMENT_PREFIX,
            Some(prefix) if prefix.len() == 1 && prefix.is_ascii() => prefix.as_bytes()[0],
            Some(prefix) => {
                return Err(HarmonizeError::InvalidSetting {
                    name: "comment_prefix",
                    message: format!("{prefix:?} must be a single ASCII character"),
                });
            }
        };

        let probe_rows = config.probe_rows.unwrap_or(DEFAULT_PROBE_ROWS);
        if probe_rows < MIN_PROBE_ROWS {
            return Err(HarmonizeError::InvalidSetting {
                name: "probe_rows",
                message: format!("{probe_rows} is below the minimum of {MIN_PROBE_ROWS}"),
            });
        }

        Ok(ResolvedConfig {
            schema_version,
            sample_sheet: Utf8PathBuf::from(sample_sheet),
            root: Utf8PathBuf::from(root),
            output_dir: Utf8PathBuf::from(output_dir),
            table,
            suffixes,
            detector: FormatDetector {
                probe_rows,
                comment_prefix,
            },
            variant: overrides.variant.or(config.variant),
        })
    }
}
