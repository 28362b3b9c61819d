//! Loosely-formatted date resolution.
//!
//! Exports spell dates in many ways. [`DateResolver`] tries an ordered list of
//! [`DateGrammar`]s and takes the first that produces a valid date:
//!
//! 1. a generic date-time reader (ISO 8601, RFC 3339/2822, `M/D/Y h:mm AM`)
//! 2. date-only grammars anchored at the start of the string
//! 3. date grammars that carry a trailing `HH:MM` time
//!
//! A grammar whose pattern matches but whose numbers do not form a calendar
//! date reports [`InvalidDate`]; the resolver then moves on to the next one.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use thiserror::Error;

/// A grammar matched, but the captured fields are not a real date or time.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{grammar} matched an impossible date")]
pub struct InvalidDate {
    pub grammar: &'static str,
}

/// A parsed point in time, with or without an explicit UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Wall-clock time in the local zone.
    Wall(NaiveDateTime),
    /// An instant carrying its own offset.
    Zoned(DateTime<FixedOffset>),
}

impl Timestamp {
    /// The wall-clock time this timestamp shows in `local`.
    pub fn to_local(self, local: FixedOffset) -> NaiveDateTime {
        match self {
            Self::Wall(naive) => naive,
            Self::Zoned(instant) => instant.with_timezone(&local).naive_local(),
        }
    }
}

/// Outcome of one grammar attempt.
///
/// `None` means the grammar does not apply to the input at all.
pub type GrammarMatch = Option<Result<Timestamp, InvalidDate>>;

/// One independently testable way of reading a date string.
pub trait DateGrammar: Send + Sync {
    /// Short human-readable name, used in logs.
    fn name(&self) -> &'static str;

    /// Attempts to read `input`, which is already trimmed.
    fn try_parse(&self, input: &str) -> GrammarMatch;
}

/// Expands a two-digit year: below 50 is the 2000s, otherwise the 1900s.
pub const fn expand_two_digit_year(year: i32) -> i32 {
    if year < 50 { 2000 + year } else { 1900 + year }
}

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Month number (1-12) for an English month name or an abbreviation of at
/// least three letters (`Jan`, `Sept`, `January`).
fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|m| m.starts_with(&lower))
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

/// Applies a 12-hour clock marker to an hour value.
///
/// `12 AM` is midnight, `12 PM` stays noon, `PM` adds 12 to hours 1 through 11.
pub fn apply_meridiem(hour: u32, marker: Option<&str>) -> u32 {
    match marker.map(str::to_ascii_uppercase).as_deref() {
        Some("PM") if hour < 12 => hour + 12,
        Some("AM") if hour == 12 => 0,
        _ => hour,
    }
}

fn number<T: std::str::FromStr>(caps: &Captures<'_>, idx: usize) -> Option<T> {
    caps.get(idx).and_then(|m| m.as_str().parse().ok())
}

fn build(
    grammar: &'static str,
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    time: Option<(u32, u32, u32)>,
) -> Result<Timestamp, InvalidDate> {
    let invalid = InvalidDate { grammar };
    let date = NaiveDate::from_ymd_opt(
        year.ok_or(invalid)?,
        month.ok_or(invalid)?,
        day.ok_or(invalid)?,
    )
    .ok_or(invalid)?;
    let (h, m, s) = time.unwrap_or((0, 0, 0));
    let time = NaiveTime::from_hms_opt(h, m, s).ok_or(invalid)?;
    Ok(Timestamp::Wall(date.and_time(time)))
}

// ========== Generic Date-Time Reader ==========

/// Offset-free layouts accepted by the generic reader, all year-first.
const NAIVE_DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const NAIVE_DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

// chrono reads `%Y` from as few as one digit, so layouts are only tried when
// the year is visibly four digits long.
static LEADING_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}[-/]").unwrap());

/// `1/15/2024`, `01/15/24 09:00`, `1/15/2024, 9:00:00 AM`
static SLASH_DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})(?:,?[\sT]+(\d{1,2}):(\d{2})(?::(\d{2}))?\s*(AM|PM)?)?$",
    )
    .unwrap()
});

/// `January 15, 2024`, `Jan 15 2024 9:00 AM`, `Jan. 15, 2024, 14:30:00`
static MONTH_NAME_DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^([a-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})(?:,?\s+(\d{1,2}):(\d{2})(?::(\d{2}))?\s*(AM|PM)?)?$",
    )
    .unwrap()
});

/// Reads the optional `H:MM[:SS] [AM|PM]` tail captured in groups 4 to 7.
fn clock_time(caps: &Captures<'_>) -> Option<(u32, u32, u32)> {
    let hour = number::<u32>(caps, 4)?;
    let minute = number::<u32>(caps, 5)?;
    let hour = apply_meridiem(hour, caps.get(7).map(|m| m.as_str()));
    Some((hour, minute, number(caps, 6).unwrap_or(0)))
}

/// Whole-string reader for the layouts a general-purpose date parser accepts.
///
/// US slash dates (`1/15/24 9:00 PM`) and month-name dates
/// (`Jan 15, 2024 9:00 AM`) are read month-first and keep their time.
/// Two-digit slash years are expanded by [`expand_two_digit_year`].
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDateTime;

impl DateGrammar for GenericDateTime {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn try_parse(&self, input: &str) -> GrammarMatch {
        if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
            return Some(Ok(Timestamp::Zoned(instant)));
        }
        if let Ok(instant) = DateTime::parse_from_rfc2822(input) {
            return Some(Ok(Timestamp::Zoned(instant)));
        }
        if LEADING_YEAR_RE.is_match(input) {
            for layout in NAIVE_DATETIME_LAYOUTS {
                if let Ok(naive) = NaiveDateTime::parse_from_str(input, layout) {
                    return Some(Ok(Timestamp::Wall(naive)));
                }
            }
            for layout in NAIVE_DATE_LAYOUTS {
                if let Ok(date) = NaiveDate::parse_from_str(input, layout) {
                    return Some(Ok(Timestamp::Wall(date.and_time(NaiveTime::MIN))));
                }
            }
        }
        if let Some(caps) = MONTH_NAME_DATETIME_RE.captures(input) {
            return Some(build(
                self.name(),
                number(&caps, 3),
                month_from_name(&caps[1]),
                number(&caps, 2),
                clock_time(&caps),
            ));
        }

        let caps = SLASH_DATETIME_RE.captures(input)?;
        let year = number::<i32>(&caps, 3).map(|y| {
            if caps[3].len() == 2 {
                expand_two_digit_year(y)
            } else {
                y
            }
        });
        Some(build(
            self.name(),
            year,
            number(&caps, 1),
            number(&caps, 2),
            clock_time(&caps),
        ))
    }
}

// ========== Anchored Date Grammars ==========

/// Which capture group holds which date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldOrder {
    /// month, day, two-digit year
    MonthDayShortYear,
    /// year, month, day
    YearMonthDay,
    /// day, month, year
    DayMonthYear,
    /// month name, day, year
    MonthNameDayYear,
}

/// A regex grammar matched against the start of the input.
///
/// Any time after the date is ignored; the result is midnight.
#[derive(Debug)]
pub struct PatternGrammar {
    name: &'static str,
    regex: Regex,
    order: FieldOrder,
}

impl PatternGrammar {
    fn new(name: &'static str, pattern: &str, order: FieldOrder) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap(),
            order,
        }
    }

    /// `MM/DD/YY`
    pub fn month_day_short_year() -> Self {
        Self::new(
            "MM/DD/YY",
            r"^(\d{1,2})/(\d{1,2})/(\d{2})(?:\s|$)",
            FieldOrder::MonthDayShortYear,
        )
    }

    /// `YYYY/MM/DD`
    pub fn year_month_day_slash() -> Self {
        Self::new(
            "YYYY/MM/DD",
            r"^(\d{4})/(\d{1,2})/(\d{1,2})(?:\s|$)",
            FieldOrder::YearMonthDay,
        )
    }

    /// `DD-MM-YYYY`
    pub fn day_month_year_dash() -> Self {
        Self::new(
            "DD-MM-YYYY",
            r"^(\d{1,2})-(\d{1,2})-(\d{4})(?:\s|$)",
            FieldOrder::DayMonthYear,
        )
    }

    /// `YYYY-MM-DD`
    pub fn year_month_day_dash() -> Self {
        Self::new(
            "YYYY-MM-DD",
            r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:\s|$)",
            FieldOrder::YearMonthDay,
        )
    }

    /// `DD.MM.YYYY`
    pub fn day_month_year_dotted() -> Self {
        Self::new(
            "DD.MM.YYYY",
            r"^(\d{1,2})\.(\d{1,2})\.(\d{4})(?:\s|$)",
            FieldOrder::DayMonthYear,
        )
    }

    /// `Mon DD, YYYY`
    pub fn month_name_day_year() -> Self {
        Self::new(
            "Mon DD, YYYY",
            r"^([A-Za-z]{3})\s+(\d{1,2}),?\s+(\d{4})(?:\s|$)",
            FieldOrder::MonthNameDayYear,
        )
    }
}

impl DateGrammar for PatternGrammar {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_parse(&self, input: &str) -> GrammarMatch {
        let caps = self.regex.captures(input)?;
        let (year, month, day) = match self.order {
            FieldOrder::MonthDayShortYear => (
                number(&caps, 3).map(expand_two_digit_year),
                number(&caps, 1),
                number(&caps, 2),
            ),
            FieldOrder::YearMonthDay => (number(&caps, 1), number(&caps, 2), number(&caps, 3)),
            FieldOrder::DayMonthYear => (number(&caps, 3), number(&caps, 2), number(&caps, 1)),
            FieldOrder::MonthNameDayYear => (
                number(&caps, 3),
                month_from_name(&caps[1]),
                number(&caps, 2),
            ),
        };
        Some(build(self.name, year, month, day, None))
    }
}

// ========== Time-Bearing Grammars ==========

/// A date grammar that also reads an `HH:MM` time and optional AM/PM marker.
#[derive(Debug)]
pub struct TimedGrammar {
    name: &'static str,
    regex: Regex,
    year_first: bool,
}

impl TimedGrammar {
    /// `MM/DD/YY HH:MM[ AM|PM]`
    pub fn month_day_short_year() -> Self {
        Self {
            name: "MM/DD/YY HH:MM",
            regex: Regex::new(r"(?i)^(\d{1,2})/(\d{1,2})/(\d{2})\s+(\d{1,2}):(\d{2})\s*(AM|PM)?")
                .unwrap(),
            year_first: false,
        }
    }

    /// `YYYY/MM/DD HH:MM`
    pub fn year_month_day() -> Self {
        Self {
            name: "YYYY/MM/DD HH:MM",
            regex: Regex::new(r"^(\d{4})/(\d{1,2})/(\d{1,2})\s+(\d{1,2}):(\d{2})").unwrap(),
            year_first: true,
        }
    }
}

impl DateGrammar for TimedGrammar {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_parse(&self, input: &str) -> GrammarMatch {
        let caps = self.regex.captures(input)?;
        let (year, month, day) = if self.year_first {
            (number(&caps, 1), number(&caps, 2), number(&caps, 3))
        } else {
            (
                number(&caps, 3).map(expand_two_digit_year),
                number(&caps, 1),
                number(&caps, 2),
            )
        };
        let marker = caps.get(6).map(|m| m.as_str());
        let hour = number::<u32>(&caps, 4).map(|h| apply_meridiem(h, marker));
        let Some(time) = hour.zip(number(&caps, 5)).map(|(h, m)| (h, m, 0)) else {
            return Some(Err(InvalidDate { grammar: self.name }));
        };
        Some(build(self.name, year, month, day, Some(time)))
    }
}

/// All grammars in priority order.
static GRAMMARS: LazyLock<Vec<Box<dyn DateGrammar>>> = LazyLock::new(|| {
    vec![
        Box::new(GenericDateTime),
        Box::new(PatternGrammar::month_day_short_year()),
        Box::new(PatternGrammar::year_month_day_slash()),
        Box::new(PatternGrammar::day_month_year_dash()),
        Box::new(PatternGrammar::year_month_day_dash()),
        Box::new(PatternGrammar::day_month_year_dotted()),
        Box::new(PatternGrammar::month_name_day_year()),
        Box::new(TimedGrammar::month_day_short_year()),
        Box::new(TimedGrammar::year_month_day()),
    ]
});

/// Resolves date strings into local wall-clock times and calendar days.
#[derive(Debug, Clone, Copy)]
pub struct DateResolver {
    local_offset: FixedOffset,
}

impl DateResolver {
    pub const fn new(local_offset: FixedOffset) -> Self {
        Self { local_offset }
    }

    pub const fn local_offset(&self) -> FixedOffset {
        self.local_offset
    }

    /// Reads `raw` as a timestamp using the first grammar that succeeds.
    pub fn resolve_timestamp(&self, raw: &str) -> Option<Timestamp> {
        let input = raw.trim();
        if input.is_empty() {
            return None;
        }
        for grammar in GRAMMARS.iter() {
            match grammar.try_parse(input) {
                Some(Ok(timestamp)) => return Some(timestamp),
                Some(Err(err)) => tracing::trace!(input, error = %err, "grammar rejected date"),
                None => {}
            }
        }
        tracing::trace!(input, "no date grammar matched");
        None
    }

    /// Reads `raw` as wall-clock time in the local zone.
    pub fn resolve_datetime(&self, raw: &str) -> Option<NaiveDateTime> {
        self.resolve_timestamp(raw)
            .map(|timestamp| timestamp.to_local(self.local_offset))
    }

    /// Reads `raw` as a calendar day, discarding any time of day.
    pub fn resolve(&self, raw: &str) -> Option<NaiveDate> {
        self.resolve_datetime(raw).map(|dt| dt.date())
    }
}
