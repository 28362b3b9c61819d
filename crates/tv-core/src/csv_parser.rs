//! CSV timesheet exports with `Start date,End date,Duration,Title,Notes` headers.

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::date::DateResolver;
use crate::duration::{CSV_MIN_HOURS, DurationContext, DurationField, DurationResolver, floor_hours};
use crate::entry::{SourceFormat, TimeEntry};
use crate::import::ImportOptions;
use crate::parser::{EntryParser, RowError};
use crate::text::{any_noise, extract_tags};

const START_DATE: &str = "Start date";
const END_DATE: &str = "End date";
const DURATION: &str = "Duration";
const TITLE: &str = "Title";
const NOTES: &str = "Notes";

/// Column positions of the recognized headers.
#[derive(Debug, Default)]
struct Columns {
    start: Option<usize>,
    end: Option<usize>,
    duration: Option<usize>,
    title: Option<usize>,
    notes: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Self {
            start: find(START_DATE),
            end: find(END_DATE),
            duration: find(DURATION),
            title: find(TITLE),
            notes: find(NOTES),
        }
    }
}

fn field(record: &StringRecord, column: Option<usize>) -> Option<&str> {
    column.and_then(|idx| record.get(idx))
}

#[derive(Debug, Clone, Copy)]
pub struct CsvParser {
    dates: DateResolver,
    durations: DurationResolver,
}

impl CsvParser {
    pub const fn new(options: &ImportOptions) -> Self {
        let dates = DateResolver::new(options.local_offset);
        Self {
            dates,
            durations: DurationResolver::new(dates),
        }
    }

    fn parse_row(&self, record: &StringRecord, columns: &Columns) -> Result<TimeEntry, RowError> {
        let start = field(record, columns.start).unwrap_or_default();
        if start.is_empty() {
            return Err(RowError::MissingStartDate);
        }
        if any_noise(record.iter()) {
            return Err(RowError::Noise);
        }

        let date = self
            .dates
            .resolve(start)
            .ok_or_else(|| RowError::InvalidDate {
                raw: start.to_string(),
            })?;

        let raw_title = field(record, columns.title).unwrap_or_default();
        let explicit = field(record, columns.duration).map_or(DurationField::Absent, DurationField::Text);
        let context = DurationContext {
            start: Some(start),
            end: field(record, columns.end).filter(|end| !end.is_empty()),
            title: Some(raw_title),
        };
        let duration = floor_hours(self.durations.resolve(explicit, &context), CSV_MIN_HOURS);

        let clean = extract_tags(raw_title);
        let category = clean.category().to_string();
        let note = field(record, columns.notes).unwrap_or_default();

        Ok(TimeEntry::new(date, duration, clean.title)
            .with_note(note)
            .with_category(category)
            .with_tags(clean.tags))
    }
}

impl EntryParser for CsvParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Csv
    }

    fn parse(&self, text: &str) -> Vec<TimeEntry> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let columns = match reader.headers() {
            Ok(headers) => Columns::from_headers(headers),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read CSV header row");
                return Vec::new();
            }
        };

        let mut entries = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            // Header is line 1.
            let line = idx + 2;
            let result = record
                .map_err(RowError::from)
                .and_then(|record| self.parse_row(&record, &columns));
            match result {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::debug!(line, reason = %e, "skipping CSV row"),
            }
        }
        entries
    }
}
