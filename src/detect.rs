//! Structural classification of count files from a small leading probe.

use std::io::Read;

use camino::Utf8Path;

use crate::domain::FormatVariant;
use crate::error::HarmonizeError;
use crate::io::open_count_file;

pub const DEFAULT_PROBE_ROWS: usize = 6;
pub const DEFAULT_COMMENT_PREFIX: u8 = b'#';

/// Rows after the first whose first field is checked for the `N_` summary prefix.
/// The first probed row is read as a header line, so it is never part of the window.
const SUMMARY_WINDOW: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDetector {
    pub probe_rows: usize,
    pub comment_prefix: u8,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self {
            probe_rows: DEFAULT_PROBE_ROWS,
            comment_prefix: DEFAULT_COMMENT_PREFIX,
        }
    }
}

impl FormatDetector {
    pub fn detect_path(&self, path: &Utf8Path) -> Result<FormatVariant, HarmonizeError> {
        let reader = open_count_file(path)?;
        self.detect_reader(reader).map_err(|err| match err {
            HarmonizeError::CountFileRead { message, .. } => HarmonizeError::CountFileRead {
                path: path.to_string(),
                message,
            },
            other => other,
        })
    }

    /// Classify from at most `probe_rows` non-comment rows; the rest of the input is never read
    /// beyond the csv reader's buffer.
    pub fn detect_reader<R: Read>(&self, reader: R) -> Result<FormatVariant, HarmonizeError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(self.comment_prefix))
            .from_reader(reader);

        let mut probe = Vec::with_capacity(self.probe_rows);
        for record in reader.records().take(self.probe_rows) {
            let record = record.map_err(|err| HarmonizeError::CountFileRead {
                path: "<reader>".to_string(),
                message: err.to_string(),
            })?;
            probe.push(record);
        }

        let columns = probe.first().map(csv::StringRecord::len).unwrap_or(0);
        let has_summary_rows = probe
            .iter()
            .skip(1)
            .take(SUMMARY_WINDOW)
            .any(|record| record.get(0).is_some_and(|field| field.starts_with("N_")));

        let variant = if (2..=4).contains(&columns) && has_summary_rows {
            FormatVariant::StarGeneCounts
        } else {
            FormatVariant::AnnotatedTable
        };
        tracing::debug!(columns, has_summary_rows, %variant, "classified count file");
        Ok(variant)
    }
}
