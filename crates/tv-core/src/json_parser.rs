//! JSON exports: a top-level array of loosely-typed objects.
//!
//! Trackers disagree on field names, so every canonical field is looked up
//! through [`FIELD_ALIASES`]. Items that share a day and title are merged by
//! [`Deduplicator`].

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde_json::{Map, Value};

use crate::date::DateResolver;
use crate::dedup::Deduplicator;
use crate::duration::{EVENT_MIN_HOURS, floor_hours, hours_between};
use crate::entry::{SourceFormat, TimeEntry};
use crate::import::ImportOptions;
use crate::parser::{EntryParser, RowError};
use crate::text::is_noise;

type Item = Map<String, Value>;

/// Canonical fields read from a JSON item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Note,
    Category,
    Tags,
    Start,
    End,
    Duration,
}

/// Source keys for each canonical field, in precedence order.
pub const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (Field::Title, &["title", "name", "summary"]),
    (Field::Note, &["note", "notes", "description", "desc"]),
    (Field::Category, &["category", "type"]),
    (Field::Tags, &["tags"]),
    (Field::Start, &["date", "startDate", "start_date"]),
    (Field::End, &["endDate", "end_date"]),
    (Field::Duration, &["duration"]),
];

/// `MM/DD/YY` at the start of a date string. Years are always 2000-based here.
static SHORT_US_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2})(?:\D|$)").unwrap());

fn aliases(field: Field) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|&(_, keys)| keys)
        .unwrap_or_default()
}

/// Null, `false`, `0` and `""` count as missing.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The first present value among the field's aliases.
fn lookup(item: &Item, field: Field) -> Option<&Value> {
    aliases(field)
        .iter()
        .filter_map(|key| item.get(*key))
        .find(|value| is_present(value))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text(item: &Item, field: Field) -> String {
    lookup(item, field)
        .and_then(scalar_text)
        .unwrap_or_default()
}

/// Tags as an array, or a comma-separated string.
fn tags(item: &Item) -> Vec<String> {
    match lookup(item, Field::Tags) {
        Some(Value::Array(values)) => values.iter().filter_map(scalar_text).collect(),
        Some(Value::String(list)) => list
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn explicit_hours(value: &Value) -> Option<f64> {
    let hours = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    hours.filter(|hours| hours.is_finite())
}

#[derive(Debug, Clone, Copy)]
pub struct JsonParser {
    dates: DateResolver,
}

impl JsonParser {
    pub const fn new(options: &ImportOptions) -> Self {
        Self {
            dates: DateResolver::new(options.local_offset),
        }
    }

    /// Reads the item's start, preferring the `MM/DD/YY` shape over the
    /// general resolver so two-digit years are never misread.
    fn start(&self, raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if let Some(caps) = SHORT_US_DATE_RE.captures(raw) {
            let date = caps[3]
                .parse::<i32>()
                .ok()
                .map(|yy| 2000 + yy)
                .zip(caps[1].parse::<u32>().ok())
                .zip(caps[2].parse::<u32>().ok())
                .and_then(|((year, month), day)| NaiveDate::from_ymd_opt(year, month, day));
            if let Some(date) = date {
                return Some(date.and_time(NaiveTime::MIN));
            }
        }
        self.dates.resolve_datetime(raw)
    }

    fn parse_item(&self, value: &Value) -> Result<TimeEntry, RowError> {
        let item = value.as_object().ok_or(RowError::NotAnObject)?;

        let title = text(item, Field::Title);
        let note = text(item, Field::Note);
        let category = text(item, Field::Category);
        let tags = tags(item);

        let raw_date = lookup(item, Field::Start)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let start = self.start(raw_date).ok_or_else(|| RowError::InvalidDate {
            raw: raw_date.to_string(),
        })?;

        let duration = lookup(item, Field::Duration)
            .and_then(explicit_hours)
            .or_else(|| {
                let end = lookup(item, Field::End).and_then(Value::as_str)?;
                let end = self.dates.resolve_datetime(end)?;
                Some(hours_between(start, end))
            })
            .unwrap_or(EVENT_MIN_HOURS);

        if is_noise(&title) || is_noise(&note) {
            return Err(RowError::Noise);
        }

        Ok(
            TimeEntry::new(start.date(), floor_hours(duration, EVENT_MIN_HOURS), title)
                .with_note(note)
                .with_category(category)
                .with_tags(tags),
        )
    }
}

impl EntryParser for JsonParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn parse(&self, text: &str) -> Vec<TimeEntry> {
        let root: Value = match serde_json::from_str(text) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!(error = %e, "failed to decode JSON export");
                return Vec::new();
            }
        };
        let Value::Array(items) = root else {
            tracing::warn!("JSON export root is not an array");
            return Vec::new();
        };

        let mut merged = Deduplicator::new();
        merged.extend(
            items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| match self.parse_item(item) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::debug!(index, reason = %e, "skipping JSON item");
                        None
                    }
                }),
        );
        merged.into_entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<TimeEntry> {
        JsonParser::new(&ImportOptions::default()).parse(text)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn aliases_resolve_in_precedence_order() {
        let entries = parse(
            r#"[{"name":"Swim","summary":"ignored","desc":"pool","type":"sport",
                 "startDate":"2024-06-01","tags":["water","cardio"]}]"#,
        );
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.title, "Swim");
        assert_eq!(entry.note, "pool");
        assert_eq!(entry.category, "sport");
        assert_eq!(entry.tags, vec!["water".to_string(), "cardio".to_string()]);
        assert_eq!(entry.date, day(2024, 6, 1));
    }

    #[test]
    fn empty_alias_falls_through_to_next() {
        let entries = parse(r#"[{"title":"","name":"Fallback","start_date":"2024-06-02"}]"#);
        assert_eq!(entries[0].title, "Fallback");
    }

    #[test]
    fn comma_separated_tags_are_split() {
        let entries = parse(r#"[{"title":"T","date":"2024-06-03","tags":"a, b ,c"}]"#);
        assert_eq!(entries[0].tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn short_us_dates_are_always_this_century() {
        let entries = parse(r#"[{"title":"Old","date":"07/04/76 10:00"}]"#);
        assert_eq!(entries[0].date, day(2076, 7, 4));
    }

    #[test]
    fn duration_floor_is_one_hour() {
        let entries = parse(
            r#"[
                {"title":"A","date":"2024-06-04","duration":0.5},
                {"title":"B","date":"2024-06-04","duration":"3.5"},
                {"title":"C","date":"2024-06-04T09:00:00","endDate":"2024-06-04T09:20:00"},
                {"title":"D","date":"2024-06-04T09:00:00","endDate":"2024-06-04T12:30:00"},
                {"title":"E","date":"2024-06-04"}
            ]"#,
        );
        let hours: Vec<f64> = entries.iter().map(|e| e.duration).collect();
        assert_eq!(hours, vec![1.0, 3.5, 1.0, 3.5, 1.0]);
    }

    #[test]
    fn items_without_valid_date_are_dropped() {
        let entries = parse(
            r#"[{"title":"No date"},{"title":"Bad","date":"soon"},
                {"title":"Number","date":20240601},42,
                {"title":"Ok","date":"2024-06-05"}]"#,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Ok");
    }

    #[test]
    fn noise_in_title_or_note_is_dropped() {
        let entries = parse(
            r#"[{"title":"Holiday","note":"To hide observances, open settings","date":"2024-01-01"},
                {"title":"如需隐藏节假日","date":"2024-01-01"},
                {"title":"Real","date":"2024-01-01"}]"#,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Real");
    }

    #[test]
    fn later_item_with_longer_note_replaces_earlier() {
        let entries = parse(
            r#"[{"title":"Gym","date":"2024-06-06","note":"legs","category":"health","duration":2},
                {"title":"Other","date":"2024-06-06"},
                {"title":"Gym","date":"2024-06-06T18:00:00","note":"legs and core","duration":3}]"#,
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Gym");
        assert_eq!(entries[0].note, "legs and core");
        assert_eq!(entries[0].category, "");
        assert!((entries[0].duration - 3.0).abs() < f64::EPSILON);
        assert_eq!(entries[1].title, "Other");
    }

    #[test]
    fn untitled_items_get_placeholder() {
        let entries = parse(r#"[{"date":"2024-06-07"}]"#);
        assert_eq!(entries[0].title, crate::entry::UNTITLED);
    }

    #[test]
    fn malformed_or_non_array_root_is_empty() {
        assert!(parse("not json").is_empty());
        assert!(parse(r#"{"title":"x","date":"2024-06-01"}"#).is_empty());
        assert!(parse("[]").is_empty());
    }

    #[test]
    fn alias_table_lists_every_field() {
        for field in [
            Field::Title,
            Field::Note,
            Field::Category,
            Field::Tags,
            Field::Start,
            Field::End,
            Field::Duration,
        ] {
            assert!(!aliases(field).is_empty(), "{field:?} has no aliases");
        }
    }
}
