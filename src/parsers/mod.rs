//! Per-variant extraction of (gene id, raw count) rows.
//!
//! The detector picks a [`FormatVariant`]; [`FormatVariant::parser`] hands back
//! the matching [`CountParser`], which the driver invokes without knowing which
//! layout it is reading.

use std::io::Read;

use crate::detect::DEFAULT_COMMENT_PREFIX;
use crate::domain::{FormatVariant, GeneCount};
use crate::error::HarmonizeError;

pub mod annotated;
pub mod star;

pub use annotated::AnnotatedTableParser;
pub use star::StarGeneCountsParser;

pub trait CountParser {
    fn variant(&self) -> FormatVariant;

    /// Parse a whole count file. Unreadable numbers coerce to zero instead of failing.
    fn parse(&self, reader: &mut dyn Read) -> Result<Vec<GeneCount>, HarmonizeError>;
}

impl FormatVariant {
    pub fn parser(self, comment_prefix: u8) -> Box<dyn CountParser> {
        match self {
            FormatVariant::StarGeneCounts => Box::new(StarGeneCountsParser),
            FormatVariant::AnnotatedTable => Box::new(AnnotatedTableParser { comment_prefix }),
        }
    }

    pub fn default_parser(self) -> Box<dyn CountParser> {
        self.parser(DEFAULT_COMMENT_PREFIX)
    }
}

fn read_error(err: csv::Error) -> HarmonizeError {
    HarmonizeError::CountFileRead {
        path: "<reader>".to_string(),
        message: err.to_string(),
    }
}
