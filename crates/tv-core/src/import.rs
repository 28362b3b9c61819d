//! Routing files to parsers and importing many files at once.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{FixedOffset, Offset, Utc};
use rayon::prelude::*;
use regex::Regex;
use thiserror::Error;

use crate::csv_parser::CsvParser;
use crate::entry::{SourceFormat, TimeEntry};
use crate::ics_parser::IcsParser;
use crate::json_parser::JsonParser;
use crate::parser::EntryParser;

/// Default local zone: the `+08:00` the ICS time policy already assumes.
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 8 * 3600;

static OFFSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])(\d{1,2})(?::?(\d{2}))?$").unwrap());

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file type: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid UTC offset: {value:?} (expected e.g. +08:00, -05:30, Z)")]
    InvalidOffset { value: String },
}

/// Settings shared by all parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Zone that calendar days are taken in.
    pub local_offset: FixedOffset,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            local_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

/// Parses `+08:00`, `-0530`, `+9`, `Z`, or `UTC` into a fixed offset.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, ImportError> {
    let trimmed = value.trim();
    let invalid = || ImportError::InvalidOffset {
        value: value.to_string(),
    };
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }
    let caps = OFFSET_RE.captures(trimmed).ok_or_else(invalid)?;
    let hours: i32 = caps[2].parse().map_err(|_| invalid())?;
    let minutes: i32 = caps
        .get(3)
        .map_or(Ok(0), |m| m.as_str().parse())
        .map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    let seconds = (hours * 60 + minutes) * 60;
    let seconds = if &caps[1] == "-" { -seconds } else { seconds };
    FixedOffset::east_opt(seconds).ok_or_else(invalid)
}

/// The parser for `format`.
pub fn parser_for(format: SourceFormat, options: &ImportOptions) -> Box<dyn EntryParser> {
    match format {
        SourceFormat::Csv => Box::new(CsvParser::new(options)),
        SourceFormat::Json => Box::new(JsonParser::new(options)),
        SourceFormat::Ics => Box::new(IcsParser::new(options)),
    }
}

/// Parses in-memory file text of a known format.
pub fn import_text(text: &str, format: SourceFormat, options: &ImportOptions) -> Vec<TimeEntry> {
    let entries = parser_for(format, options).parse(text);
    tracing::debug!(%format, count = entries.len(), "parsed entries");
    entries
}

/// Reads one file and parses it according to its extension.
pub fn import_file(path: &Path, options: &ImportOptions) -> Result<Vec<TimeEntry>, ImportError> {
    let format = SourceFormat::from_path(path).ok_or_else(|| ImportError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let text = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(import_text(&text, format, options))
}

/// Outcome of importing several files.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Entries from every file that could be read, in the order files were given.
    pub entries: Vec<TimeEntry>,
    /// Files that contributed nothing because they could not be read or routed.
    pub failures: Vec<ImportError>,
}

/// Imports files in parallel. One bad file never affects the others.
pub fn import_files<P: AsRef<Path> + Sync>(paths: &[P], options: &ImportOptions) -> ImportReport {
    let results: Vec<_> = paths
        .par_iter()
        .map(|path| import_file(path.as_ref(), options))
        .collect();

    let mut report = ImportReport::default();
    for result in results {
        match result {
            Ok(entries) => report.entries.extend(entries),
            Err(e) => {
                tracing::warn!(error = %e, "skipping file");
                report.failures.push(e);
            }
        }
    }
    report
}
