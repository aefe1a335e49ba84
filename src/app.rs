use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::detect::FormatDetector;
use crate::discovery::{default_suffixes, discover_count_files};
use crate::domain::{CanonicalCountRecord, CountFile, FormatVariant, SampleId};
use crate::error::HarmonizeError;
use crate::io::open_count_file;
use crate::sheet::IdentityMap;
use crate::sink::{CountSink, SinkReport};
use crate::table::MergedCountTable;

#[derive(Debug, Clone)]
pub struct HarmonizeOptions {
    pub suffixes: Vec<String>,
    pub detector: FormatDetector,
    /// Skip detection and parse every file as this variant.
    pub forced_variant: Option<FormatVariant>,
}

impl Default for HarmonizeOptions {
    fn default() -> Self {
        Self {
            suffixes: default_suffixes(),
            detector: FormatDetector::default(),
            forced_variant: None,
        }
    }
}

impl From<&ResolvedConfig> for HarmonizeOptions {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            suffixes: config.suffixes.clone(),
            detector: config.detector,
            forced_variant: config.variant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Loaded,
    Unmapped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub file_id: String,
    pub path: String,
    pub status: FileStatus,
    pub sample_id: Option<String>,
    pub variant: Option<FormatVariant>,
    pub rows: usize,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub files_discovered: usize,
    pub files_loaded: usize,
    pub files_unmapped: usize,
    pub files_failed: usize,
    pub rows: usize,
    pub samples: usize,
    pub files: Vec<FileOutcome>,
    pub sink: Option<SinkReport>,
    pub completed_at: Option<String>,
}

impl RunReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome.status {
            FileStatus::Loaded => self.files_loaded += 1,
            FileStatus::Unmapped => self.files_unmapped += 1,
            FileStatus::Failed => self.files_failed += 1,
        }
        self.files.push(outcome);
    }
}

#[derive(Debug, Clone)]
pub struct HarmonizeOutcome {
    pub table: MergedCountTable,
    pub report: RunReport,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Walks a count directory tree and merges every resolvable file into one table.
#[derive(Debug, Clone)]
pub struct Harmonizer<'a> {
    identity: &'a IdentityMap,
    options: HarmonizeOptions,
}

impl<'a> Harmonizer<'a> {
    pub fn new(identity: &'a IdentityMap, options: HarmonizeOptions) -> Self {
        Self { identity, options }
    }

    /// Harmonize every count file under `root`.
    ///
    /// Unmapped and unparseable files are skipped and reported; the run only
    /// fails when no file contributed a single row.
    pub fn run(
        &self,
        root: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<HarmonizeOutcome, HarmonizeError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Discover; scanning {root}"),
            elapsed: None,
        });
        let paths = discover_count_files(root, &self.options.suffixes)?;
        if self.identity.is_empty() {
            tracing::warn!(
                columns = ?self.identity.columns(),
                "sample sheet has no usable file id/file name + sample id columns"
            );
        }

        let mut report = RunReport {
            files_discovered: paths.len(),
            ..RunReport::default()
        };
        let mut table = MergedCountTable::new();

        for path in paths {
            let file = match CountFile::from_path(path.clone()) {
                Ok(file) => file,
                Err(err) => {
                    tracing::warn!(path = %path, error = %err, "skipping count file");
                    report.record(FileOutcome {
                        file_id: String::new(),
                        path: path.to_string(),
                        status: FileStatus::Failed,
                        sample_id: None,
                        variant: None,
                        rows: 0,
                        reason: Some(err.to_string()),
                    });
                    continue;
                }
            };

            let Some(sample_id) = self.identity.resolve_file(&file) else {
                tracing::info!(file_id = %file.file_id, "no sample mapping; skipping");
                report.record(FileOutcome {
                    file_id: file.file_id.to_string(),
                    path: file.path.to_string(),
                    status: FileStatus::Unmapped,
                    sample_id: None,
                    variant: None,
                    rows: 0,
                    reason: None,
                });
                continue;
            };

            sink.event(ProgressEvent {
                message: format!("phase=Parse; {} -> {}", file.file_id, sample_id),
                elapsed: Some(started.elapsed()),
            });
            match self.harmonize_file(&file, &sample_id) {
                Ok((variant, records)) => {
                    let rows = records.len();
                    table.extend(records);
                    report.record(FileOutcome {
                        file_id: file.file_id.to_string(),
                        path: file.path.to_string(),
                        status: FileStatus::Loaded,
                        sample_id: Some(sample_id.to_string()),
                        variant: Some(variant),
                        rows,
                        reason: None,
                    });
                }
                Err(err) => {
                    tracing::warn!(file_id = %file.file_id, error = %err, "skipping count file");
                    report.record(FileOutcome {
                        file_id: file.file_id.to_string(),
                        path: file.path.to_string(),
                        status: FileStatus::Failed,
                        sample_id: Some(sample_id.to_string()),
                        variant: None,
                        rows: 0,
                        reason: Some(err.to_string()),
                    });
                }
            }
        }

        if table.is_empty() {
            return Err(HarmonizeError::NoDataCollected);
        }

        report.rows = table.len();
        report.samples = table.sample_count();
        sink.event(ProgressEvent {
            message: format!(
                "phase=Merge; {} rows from {} samples",
                report.rows, report.samples
            ),
            elapsed: Some(started.elapsed()),
        });
        Ok(HarmonizeOutcome { table, report })
    }

    /// Detect, parse and tag a single count file.
    pub fn harmonize_file(
        &self,
        file: &CountFile,
        sample_id: &SampleId,
    ) -> Result<(FormatVariant, Vec<CanonicalCountRecord>), HarmonizeError> {
        let variant = match self.options.forced_variant {
            Some(variant) => variant,
            None => self.options.detector.detect_path(&file.path)?,
        };
        let parser = variant.parser(self.options.detector.comment_prefix);
        let mut reader = open_count_file(&file.path)?;
        let counts = parser.parse(&mut reader).map_err(|err| with_path(err, &file.path))?;
        let records = counts
            .into_iter()
            .map(|count| CanonicalCountRecord::tagged(sample_id, count))
            .collect();
        Ok((variant, records))
    }

    /// Harmonize `root` and hand the merged table to `target` under `table_name`.
    pub fn load_into(
        &self,
        root: &Utf8Path,
        target: &dyn CountSink,
        table_name: &str,
        sink: &dyn ProgressSink,
    ) -> Result<HarmonizeOutcome, HarmonizeError> {
        let mut outcome = self.run(root, sink)?;
        sink.event(ProgressEvent {
            message: format!("phase=Load; replacing table {table_name}"),
            elapsed: None,
        });
        let loaded = target.replace_table(table_name, &outcome.table)?;
        tracing::info!(
            rows = loaded.rows,
            samples = loaded.samples,
            table = %loaded.table,
            "loaded merged counts"
        );
        outcome.report.sink = Some(loaded);
        outcome.report.completed_at = Some(chrono::Utc::now().to_rfc3339());
        Ok(outcome)
    }
}

fn with_path(err: HarmonizeError, path: &Utf8Path) -> HarmonizeError {
    match err {
        HarmonizeError::CountFileRead { message, .. } => HarmonizeError::CountFileRead {
            path: path.to_string(),
            message,
        },
        HarmonizeError::EmptyCountFile(_) => HarmonizeError::EmptyCountFile(path.to_string()),
        other => other,
    }
}
