//! The canonical time entry every source format is reduced to.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Title given to entries whose source title is blank.
pub const UNTITLED: &str = "Untitled Event";

/// One normalized unit of tracked time.
///
/// `date` is a calendar day; any time-of-day in the source is dropped during
/// normalization, so two entries on the same day always compare equal on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Calendar day the activity started on, in the configured local zone.
    pub date: NaiveDate,
    /// Elapsed hours. Always positive; each format applies its own floor.
    pub duration: f64,
    /// Display title, never empty.
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl TimeEntry {
    /// Creates an entry with no note, category, or tags.
    ///
    /// A blank `title` is replaced with [`UNTITLED`].
    pub fn new(date: NaiveDate, duration: f64, title: impl Into<String>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            title
        };
        Self {
            date,
            duration,
            title,
            note: String::new(),
            category: String::new(),
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Merge key: the ISO calendar day joined to the title.
    pub fn merge_key(&self) -> String {
        format!("{}_{}", self.date.format("%Y-%m-%d"), self.title)
    }
}

/// The source file formats the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
    Ics,
}

impl SourceFormat {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Ics => "ics",
        }
    }

    /// Routes a file to a format by its extension, ignoring case.
    ///
    /// Returns `None` for any extension other than `.csv`, `.json`, `.ics`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.to_ascii_lowercase().parse().ok())
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "ics" => Ok(Self::Ics),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Error type for unrecognized format names.
#[derive(Debug, Clone)]
pub struct UnknownFormat(String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown source format: {}", self.0)
    }
}

impl std::error::Error for UnknownFormat {}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn blank_title_becomes_placeholder() {
        let entry = TimeEntry::new(day(2024, 1, 15), 1.0, "   ");
        assert_eq!(entry.title, UNTITLED);
    }

    #[test]
    fn merge_key_joins_iso_day_and_title() {
        let entry = TimeEntry::new(day(2024, 3, 5), 2.0, "Standup");
        assert_eq!(entry.merge_key(), "2024-03-05_Standup");
    }

    #[test]
    fn serializes_date_as_iso_day_and_skips_empty_fields() {
        let entry = TimeEntry::new(day(2024, 1, 15), 1.5, "Run").with_tags(vec!["fitness".into()]);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"date":"2024-01-15","duration":1.5,"title":"Run","tags":["fitness"]}"#
        );
    }

    #[test]
    fn format_from_path_ignores_case() {
        assert_eq!(
            SourceFormat::from_path(Path::new("export/Report.CSV")),
            Some(SourceFormat::Csv)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("cal.ics")),
            Some(SourceFormat::Ics)
        );
        assert_eq!(SourceFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(SourceFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn format_roundtrips_through_strings() {
        for format in [SourceFormat::Csv, SourceFormat::Json, SourceFormat::Ics] {
            let parsed: SourceFormat = format.to_string().parse().expect("should parse");
            assert_eq!(parsed, format);
        }
        let err = "xlsx".parse::<SourceFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unknown source format: xlsx");
    }
}
