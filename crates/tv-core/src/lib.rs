//! Import pipeline for time-tracking exports.
//!
//! This crate turns CSV, JSON, and ICS exports into one list of
//! [`TimeEntry`] records:
//! - Date and duration resolution across loosely formatted inputs
//! - Title cleanup, tag extraction, and boilerplate filtering
//! - Per-format parsers behind the [`EntryParser`] seam
//! - Filtering and heatmap shaping of the merged result

pub mod csv_parser;
pub mod date;
mod dedup;
pub mod duration;
pub mod entry;
pub mod filter;
pub mod ics_parser;
pub mod import;
pub mod json_parser;
pub mod parser;
pub mod text;

pub use csv_parser::CsvParser;
pub use date::{DateResolver, InvalidDate, Timestamp};
pub use dedup::Deduplicator;
pub use duration::{DurationContext, DurationField, DurationResolver};
pub use entry::{SourceFormat, TimeEntry, UNTITLED, UnknownFormat};
pub use filter::{EntryFilter, HeatmapInput, expand_occurrences, latest_year};
pub use ics_parser::IcsParser;
pub use import::{
    ImportError, ImportOptions, ImportReport, import_file, import_files, import_text,
    parse_utc_offset, parser_for,
};
pub use json_parser::JsonParser;
pub use parser::{EntryParser, RowError};
pub use text::{CleanTitle, extract_tags, is_noise};
