//! The seam shared by all source-format parsers.

use thiserror::Error;

use crate::entry::{SourceFormat, TimeEntry};

/// Why a single row, item, or event was left out of the output.
///
/// These never reach callers; parsers log them and move on.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("row has no start date")]
    MissingStartDate,
    #[error("row matches boilerplate text")]
    Noise,
    #[error("unrecognized date: {raw:?}")]
    InvalidDate { raw: String },
    #[error("item is not a JSON object")]
    NotAnObject,
    #[error("malformed CSV record: {0}")]
    Csv(#[from] csv::Error),
}

/// Turns the text of one file into time entries.
///
/// Parsing is best-effort: unusable rows are skipped, and a file that cannot
/// be decoded at all yields no entries rather than an error.
pub trait EntryParser: Send + Sync {
    fn format(&self) -> SourceFormat;

    fn parse(&self, text: &str) -> Vec<TimeEntry>;
}
