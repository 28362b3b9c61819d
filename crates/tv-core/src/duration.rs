//! Elapsed-hours resolution from explicit fields, phrases, or start/end pairs.

use std::sync::LazyLock;

use regex::Regex;

use crate::date::DateResolver;

/// Minimum hours for a CSV row, so zero-length activities still show up.
pub const CSV_MIN_HOURS: f64 = 0.1;

/// Minimum hours for JSON items and ICS events.
pub const EVENT_MIN_HOURS: f64 = 1.0;

/// Matches "N小时[M分钟]" ("N hours [M minutes]").
static HOURS_PHRASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)小时\s*(?:(\d+)分钟?)?").unwrap());

static ISO_HOURS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)H").unwrap());
static ISO_MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)M").unwrap());
static ISO_SECONDS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)S").unwrap());

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// The value found in a source's duration field, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationField<'a> {
    Hours(f64),
    Text(&'a str),
    Absent,
}

/// Other fields of the same record that may imply a duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationContext<'a> {
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
    pub title: Option<&'a str>,
}

/// Raises `hours` to at least `min`; NaN becomes `min`.
pub fn floor_hours(hours: f64, min: f64) -> f64 {
    hours.max(min)
}

/// Hours between two wall-clock times; negative when `end` precedes `start`.
#[expect(
    clippy::cast_precision_loss,
    reason = "millisecond deltas between calendar dates fit easily in f64"
)]
pub fn hours_between(start: chrono::NaiveDateTime, end: chrono::NaiveDateTime) -> f64 {
    (end - start).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Reads "N小时[M分钟]" anywhere in `text` as `N + M/60` hours.
pub fn parse_hours_phrase(text: &str) -> Option<f64> {
    let caps = HOURS_PHRASE_RE.captures(text)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0);
    Some(hours + minutes / 60.0)
}

/// Sums the `H`, `M` and `S` components of an ISO 8601 `PT#H#M#S` token.
///
/// Components that are absent contribute nothing; an unrecognized token is 0.
pub fn parse_iso_duration(value: &str) -> f64 {
    let time_part = value.split_once("PT").map_or(value, |(_, rest)| rest);
    let component = |re: &Regex| -> f64 {
        re.captures(time_part)
            .and_then(|caps| caps[1].parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    component(&ISO_HOURS_RE)
        + component(&ISO_MINUTES_RE) / 60.0
        + component(&ISO_SECONDS_RE) / 3600.0
}

/// Derives a duration in hours from whatever a record offers.
#[derive(Debug, Clone, Copy)]
pub struct DurationResolver {
    dates: DateResolver,
}

impl DurationResolver {
    pub const fn new(dates: DateResolver) -> Self {
        Self { dates }
    }

    /// Resolves hours in priority order:
    ///
    /// 1. an explicit number
    /// 2. explicit text that is a plain decimal
    /// 3. an hours phrase in the explicit text, then in the title
    /// 4. the delta between resolvable start and end times (may be negative)
    ///
    /// Returns 0 when nothing applies; callers apply their own floor.
    pub fn resolve(&self, explicit: DurationField<'_>, context: &DurationContext<'_>) -> f64 {
        let text = match explicit {
            DurationField::Hours(hours) => return hours,
            DurationField::Text(text) => {
                if let Some(hours) = text.trim().parse::<f64>().ok().filter(|h| h.is_finite()) {
                    return hours;
                }
                Some(text)
            }
            DurationField::Absent => None,
        };

        if let Some(hours) = text
            .and_then(parse_hours_phrase)
            .or_else(|| context.title.and_then(parse_hours_phrase))
        {
            return hours;
        }

        if let (Some(start), Some(end)) = (context.start, context.end) {
            if let (Some(start), Some(end)) = (
                self.dates.resolve_datetime(start),
                self.dates.resolve_datetime(end),
            ) {
                return hours_between(start, end);
            }
        }

        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::FixedOffset;

    fn resolver() -> DurationResolver {
        DurationResolver::new(DateResolver::new(FixedOffset::east_opt(8 * 3600).unwrap()))
    }

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn explicit_number_wins() {
        let ctx = DurationContext {
            start: Some("01/15/24 09:00"),
            end: Some("01/15/24 17:00"),
            title: Some("2小时"),
        };
        approx(resolver().resolve(DurationField::Hours(0.75), &ctx), 0.75);
    }

    #[test]
    fn plain_decimal_text_is_read_directly() {
        let r = resolver();
        approx(r.resolve(DurationField::Text(" 2.5 "), &DurationContext::default()), 2.5);
        approx(r.resolve(DurationField::Text("0"), &DurationContext::default()), 0.0);
    }

    #[test]
    fn hours_phrase_in_field_or_title() {
        let r = resolver();
        approx(
            r.resolve(DurationField::Text("2小时30分钟"), &DurationContext::default()),
            2.5,
        );
        let ctx = DurationContext {
            title: Some("阅读 1小时 15分"),
            ..DurationContext::default()
        };
        approx(r.resolve(DurationField::Text(""), &ctx), 1.25);
        approx(r.resolve(DurationField::Absent, &ctx), 1.25);
    }

    #[test]
    fn start_end_delta_is_not_clamped() {
        let r = resolver();
        let ctx = DurationContext {
            start: Some("01/15/24 09:00"),
            end: Some("01/15/24 10:30"),
            title: None,
        };
        approx(r.resolve(DurationField::Text(""), &ctx), 1.5);

        let backwards = DurationContext {
            start: Some("01/15/24 10:30"),
            end: Some("01/15/24 09:00"),
            title: None,
        };
        approx(r.resolve(DurationField::Absent, &backwards), -1.5);
    }

    #[test]
    fn unresolved_duration_is_zero() {
        let ctx = DurationContext {
            start: Some("01/15/24 09:00"),
            end: Some("whenever"),
            title: Some("Meeting"),
        };
        approx(resolver().resolve(DurationField::Text("n/a"), &ctx), 0.0);
        approx(resolver().resolve(DurationField::Absent, &DurationContext::default()), 0.0);
    }

    #[test]
    fn non_finite_text_is_not_a_number() {
        approx(
            resolver().resolve(DurationField::Text("NaN"), &DurationContext::default()),
            0.0,
        );
    }

    #[test]
    fn iso_duration_sums_components() {
        approx(parse_iso_duration("PT1H30M"), 1.5);
        approx(parse_iso_duration("PT45M"), 0.75);
        approx(parse_iso_duration("PT2H0M36S"), 2.01);
        approx(parse_iso_duration("P1D"), 0.0);
    }

    #[test]
    fn floor_raises_small_and_nan_values() {
        approx(floor_hours(0.0, CSV_MIN_HOURS), 0.1);
        approx(floor_hours(-3.0, EVENT_MIN_HOURS), 1.0);
        approx(floor_hours(f64::NAN, EVENT_MIN_HOURS), 1.0);
        approx(floor_hours(2.5, EVENT_MIN_HOURS), 2.5);
    }
}
