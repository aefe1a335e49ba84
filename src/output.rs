use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunReport};
use crate::domain::FormatVariant;
use crate::sheet::{IdentityMap, KeyRole, SheetColumns};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectResult {
    pub path: String,
    pub variant: FormatVariant,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub role: KeyRole,
    pub keys: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetResult {
    pub path: String,
    pub rows: usize,
    pub headers: Vec<String>,
    pub columns: SheetColumns,
    pub candidates: Vec<CandidateSummary>,
}

impl SheetResult {
    pub fn new(path: &str, rows: usize, headers: Vec<String>, identity: &IdentityMap) -> Self {
        Self {
            path: path.to_string(),
            rows,
            headers,
            columns: identity.columns().clone(),
            candidates: identity
                .candidates()
                .iter()
                .map(|candidate| CandidateSummary {
                    role: candidate.role,
                    keys: candidate.len(),
                })
                .collect(),
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(result: &RunReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_detect(result: &DetectResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_sheet(result: &SheetResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress events to the tracing subscriber.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => {
                let elapsed_ms = elapsed.as_millis() as u64;
                tracing::info!(elapsed_ms, "{}", event.message);
            }
            None => tracing::info!("{}", event.message),
        }
    }
}
