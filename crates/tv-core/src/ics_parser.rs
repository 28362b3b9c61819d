//! iCalendar files: one entry per `VEVENT`.
//!
//! Times are read with a fixed policy rather than full time zone support:
//! values tagged with a Shanghai or Taipei `TZID`, bare dates, and UTC or
//! floating date-times are all taken as `+08:00`. Values tagged with any
//! other `TZID` are local wall-clock time.

use std::sync::LazyLock;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use thiserror::Error;

use crate::date::Timestamp;
use crate::duration::{EVENT_MIN_HOURS, floor_hours, hours_between, parse_iso_duration};
use crate::entry::{SourceFormat, TimeEntry};
use crate::import::ImportOptions;
use crate::parser::EntryParser;

/// Offset applied by the ICS time policy.
const CHINA_STANDARD_TIME_SECS: i32 = 8 * 3600;

/// Zone identifiers that get the fixed `+08:00` offset.
const CHINA_ZONES: &[&str] = &["Shanghai", "Taipei"];

static ICS_DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})(\d{2})(\d{2})(?:[Tt](\d{2})(\d{2})(\d{2})?)?[Zz]?$").unwrap()
});

#[derive(Debug, Error)]
enum PropertyError {
    #[error("malformed date-time value: {0:?}")]
    DateTime(String),
    #[error("property line has no value separator")]
    NoValue,
}

/// Splits text into logical lines, joining folded continuation lines.
///
/// A line starting with a space or tab continues the previous line; the
/// single leading whitespace character is dropped.
pub fn unfold_lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = Vec::new();
    for line in normalized.split('\n') {
        let continuation = line.strip_prefix(' ').or_else(|| line.strip_prefix('\t'));
        match (continuation, lines.last_mut()) {
            (Some(rest), Some(previous)) => previous.push_str(rest),
            _ => lines.push(line.to_string()),
        }
    }
    lines
}

/// Reverses iCalendar text escaping (`\n`, `\,`, `\;`, `\\`).
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped @ (',' | ';' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// One `NAME;PARAM=VALUE:value` content line.
#[derive(Debug)]
struct Property<'a> {
    name: String,
    params: Vec<(String, &'a str)>,
    value: &'a str,
}

impl<'a> Property<'a> {
    fn parse(line: &'a str) -> Result<Self, PropertyError> {
        // The first colon outside a quoted parameter value ends the name part.
        let mut in_quotes = false;
        let split = line.char_indices().find_map(|(idx, c)| match c {
            '"' => {
                in_quotes = !in_quotes;
                None
            }
            ':' if !in_quotes => Some(idx),
            _ => None,
        });
        let split = split.ok_or(PropertyError::NoValue)?;
        let (head, value) = (&line[..split], &line[split + 1..]);

        let mut parts = head.split(';');
        let name = parts.next().unwrap_or_default().trim().to_ascii_uppercase();
        let params = parts
            .filter_map(|part| part.split_once('='))
            .map(|(key, val)| (key.trim().to_ascii_uppercase(), val.trim_matches('"')))
            .collect();
        Ok(Self {
            name,
            params,
            value: value.trim(),
        })
    }

    fn param(&self, key: &str) -> Option<&'a str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|&(_, value)| value)
    }
}

/// Reads a `DTSTART`/`DTEND` value under the fixed time policy.
fn decode_datetime(value: &str, tzid: Option<&str>) -> Result<Timestamp, PropertyError> {
    let malformed = || PropertyError::DateTime(value.to_string());
    let caps = ICS_DATETIME_RE.captures(value).ok_or_else(malformed)?;
    let field = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = caps[1].parse::<i32>().map_err(|_| malformed())?;
    let date = field(2)
        .zip(field(3))
        .and_then(|(month, day)| NaiveDate::from_ymd_opt(year, month, day))
        .ok_or_else(malformed)?;
    let time = match field(4).zip(field(5)) {
        Some((hour, minute)) => {
            NaiveTime::from_hms_opt(hour, minute, field(6).unwrap_or(0)).ok_or_else(malformed)?
        }
        None => NaiveTime::MIN,
    };
    let naive = date.and_time(time);

    let is_other_zone = tzid.is_some_and(|zone| !CHINA_ZONES.iter().any(|z| zone.contains(z)));
    if is_other_zone {
        return Ok(Timestamp::Wall(naive));
    }
    let offset = FixedOffset::east_opt(CHINA_STANDARD_TIME_SECS).ok_or_else(malformed)?;
    naive
        .and_local_timezone(offset)
        .single()
        .map(Timestamp::Zoned)
        .ok_or_else(malformed)
}

/// How long an event lasts, as first declared.
#[derive(Debug, Clone, Copy)]
enum Length {
    Hours(f64),
    Until(NaiveDateTime),
}

/// Fields gathered for the event currently being read.
#[derive(Debug, Default)]
struct EventDraft {
    start: Option<NaiveDateTime>,
    length: Option<Length>,
    title: Option<String>,
    note: Option<String>,
    categories: Vec<String>,
}

impl EventDraft {
    /// Builds the entry, or `None` when the date or title is missing.
    fn finish(self) -> Option<TimeEntry> {
        let start = self.start?;
        let title = self.title?;
        let hours = match self.length {
            Some(Length::Hours(hours)) => hours,
            Some(Length::Until(end)) => hours_between(start, end),
            None => EVENT_MIN_HOURS,
        };
        let category = self.categories.first().cloned().unwrap_or_default();
        Some(
            TimeEntry::new(start.date(), floor_hours(hours, EVENT_MIN_HOURS), title)
                .with_note(self.note.unwrap_or_default())
                .with_category(category)
                .with_tags(self.categories),
        )
    }
}

/// Scanner position relative to `VEVENT` blocks.
#[derive(Debug)]
enum State {
    OutsideEvent,
    /// `depth` counts nested components such as `VALARM`.
    InEvent { draft: EventDraft, depth: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct IcsParser {
    local_offset: FixedOffset,
}

impl IcsParser {
    pub const fn new(options: &ImportOptions) -> Self {
        Self {
            local_offset: options.local_offset,
        }
    }

    fn apply(&self, draft: &mut EventDraft, line: &str) -> Result<(), PropertyError> {
        let property = Property::parse(line)?;
        match property.name.as_str() {
            "DTSTART" => {
                let start = decode_datetime(property.value, property.param("TZID"))?;
                draft.start = Some(start.to_local(self.local_offset));
            }
            "DTEND" if draft.length.is_none() => {
                let end = decode_datetime(property.value, property.param("TZID"))?;
                draft.length = Some(Length::Until(end.to_local(self.local_offset)));
            }
            "DURATION" if draft.length.is_none() => {
                draft.length = Some(Length::Hours(parse_iso_duration(property.value)));
            }
            "SUMMARY" => {
                let title = unescape_text(property.value).trim().to_string();
                draft.title = (!title.is_empty()).then_some(title);
            }
            "DESCRIPTION" => {
                draft.note = Some(unescape_text(property.value).trim().to_string());
            }
            "CATEGORIES" => {
                draft.categories = property
                    .value
                    .split(',')
                    .map(|category| unescape_text(category.trim()))
                    .filter(|category| !category.is_empty())
                    .collect();
            }
            _ => {}
        }
        Ok(())
    }
}

impl EntryParser for IcsParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Ics
    }

    fn parse(&self, text: &str) -> Vec<TimeEntry> {
        let mut entries = Vec::new();
        let mut state = State::OutsideEvent;

        for raw in unfold_lines(text) {
            let line = raw.trim();
            if line.eq_ignore_ascii_case("BEGIN:VEVENT") {
                if matches!(state, State::InEvent { .. }) {
                    tracing::debug!("VEVENT opened before the previous one closed");
                }
                state = State::InEvent {
                    draft: EventDraft::default(),
                    depth: 0,
                };
                continue;
            }

            let State::InEvent { draft, depth } = &mut state else {
                continue;
            };

            let upper = line.to_ascii_uppercase();
            if upper.starts_with("BEGIN:") {
                *depth += 1;
                continue;
            }
            if upper == "END:VEVENT" {
                let finished = std::mem::replace(&mut state, State::OutsideEvent);
                if let State::InEvent { draft, .. } = finished {
                    match draft.finish() {
                        Some(entry) => entries.push(entry),
                        None => tracing::debug!("dropping VEVENT without date or title"),
                    }
                }
                continue;
            }
            if upper.starts_with("END:") && *depth > 0 {
                *depth -= 1;
                continue;
            }
            if *depth > 0 || line.is_empty() {
                continue;
            }

            if let Err(e) = self.apply(draft, line) {
                tracing::debug!(line, error = %e, "skipping ICS property");
            }
        }

        entries
    }
}
