//! Narrowing imported entries and shaping them for a calendar heatmap.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::entry::TimeEntry;

/// Default lower bound of the duration range, in hours.
pub const DEFAULT_MIN_HOURS: f64 = 0.0;
/// Default upper bound of the duration range, in hours.
pub const DEFAULT_MAX_HOURS: f64 = 24.0;

/// Keyword and duration-range filter.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFilter {
    /// Case-insensitive substring matched against title, note, category, and tags.
    pub keyword: Option<String>,
    pub min_hours: f64,
    pub max_hours: f64,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            keyword: None,
            min_hours: DEFAULT_MIN_HOURS,
            max_hours: DEFAULT_MAX_HOURS,
        }
    }
}

impl EntryFilter {
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        self.keyword = (!keyword.trim().is_empty()).then_some(keyword);
        self
    }

    #[must_use]
    pub const fn with_range(mut self, min_hours: f64, max_hours: f64) -> Self {
        self.min_hours = min_hours;
        self.max_hours = max_hours;
        self
    }

    /// Both bounds are inclusive.
    pub fn matches(&self, entry: &TimeEntry) -> bool {
        if entry.duration < self.min_hours || entry.duration > self.max_hours {
            return false;
        }
        let Some(keyword) = self.keyword.as_deref() else {
            return true;
        };
        let needle = keyword.to_lowercase();
        let hit = |field: &str| field.to_lowercase().contains(&needle);
        hit(&entry.title)
            || hit(&entry.note)
            || hit(&entry.category)
            || entry.tags.iter().any(|tag| hit(tag))
    }

    /// Matching entries, in their original order.
    pub fn apply<'a>(&self, entries: &'a [TimeEntry]) -> Vec<&'a TimeEntry> {
        entries.iter().filter(|entry| self.matches(entry)).collect()
    }
}

/// Most occurrences a single entry contributes: one per hour of its day.
pub const MAX_OCCURRENCES_PER_ENTRY: usize = 24;

/// One date per started hour of each entry, so longer activities weigh more.
///
/// Each entry contributes at most [`MAX_OCCURRENCES_PER_ENTRY`] dates.
pub fn expand_occurrences<'a>(entries: impl IntoIterator<Item = &'a TimeEntry>) -> Vec<NaiveDate> {
    entries
        .into_iter()
        .flat_map(|entry| {
            let hours = entry.duration.clamp(0.0, 24.0).ceil();
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "clamped to 0..=24 above; NaN casts to 0"
            )]
            let count = (hours as usize).min(MAX_OCCURRENCES_PER_ENTRY);
            std::iter::repeat_n(entry.date, count)
        })
        .collect()
}

/// The most recent year present, used when no year is chosen.
pub fn latest_year<'a>(entries: impl IntoIterator<Item = &'a TimeEntry>) -> Option<i32> {
    entries.into_iter().map(|entry| entry.date.year()).max()
}

/// Payload handed to a calendar heatmap renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapInput {
    pub year: i32,
    /// One date per occurrence within `year`.
    pub dates: Vec<NaiveDate>,
}

impl HeatmapInput {
    /// Builds the payload, defaulting `year` to the latest year in `entries`.
    /// Returns `None` when there is nothing to show and no year was given.
    pub fn from_entries(entries: &[&TimeEntry], year: Option<i32>) -> Option<Self> {
        let year = year.or_else(|| latest_year(entries.iter().copied()))?;
        let in_year = entries.iter().copied().filter(|entry| entry.date.year() == year);
        Some(Self {
            year,
            dates: expand_occurrences(in_year),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(y: i32, m: u32, d: u32, hours: f64, title: &str) -> TimeEntry {
        TimeEntry::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), hours, title)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn keyword_matches_any_text_field_case_insensitively() {
        let entries = vec![
            entry(2024, 1, 1, 1.0, "Morning RUN"),
            entry(2024, 1, 2, 1.0, "Read").with_note("ran through chapter 3"),
            entry(2024, 1, 3, 1.0, "Gym").with_category("Running"),
            entry(2024, 1, 4, 1.0, "Walk").with_tags(vec!["trail-run".into()]),
            entry(2024, 1, 5, 1.0, "Sleep"),
        ];
        let filter = EntryFilter::default().with_keyword("run");
        let titles: Vec<_> = filter
            .apply(&entries)
            .into_iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Morning RUN", "Gym", "Walk"]);
    }

    #[test]
    fn blank_keyword_matches_everything() {
        let filter = EntryFilter::default().with_keyword("   ");
        assert_eq!(filter.keyword, None);
        assert!(filter.matches(&entry(2024, 1, 1, 1.0, "Anything")));
    }

    #[test]
    fn duration_range_is_inclusive() {
        let filter = EntryFilter::default().with_range(1.0, 2.0);
        assert!(filter.matches(&entry(2024, 1, 1, 1.0, "low")));
        assert!(filter.matches(&entry(2024, 1, 1, 2.0, "high")));
        assert!(!filter.matches(&entry(2024, 1, 1, 0.5, "below")));
        assert!(!filter.matches(&entry(2024, 1, 1, 2.5, "above")));
    }

    #[test]
    fn occurrences_round_partial_hours_up() {
        let entries = [
            entry(2024, 3, 1, 1.5, "a"),
            entry(2024, 3, 2, 0.1, "b"),
            entry(2024, 3, 3, 3.0, "c"),
        ];
        let dates = expand_occurrences(&entries);
        assert_eq!(
            dates,
            vec![
                day(2024, 3, 1),
                day(2024, 3, 1),
                day(2024, 3, 2),
                day(2024, 3, 3),
                day(2024, 3, 3),
                day(2024, 3, 3),
            ]
        );
    }

    #[test]
    fn occurrences_are_capped_per_entry() {
        let entries = [entry(2024, 3, 1, 1e11, "huge"), entry(2024, 3, 2, 30.5, "long")];
        let dates = expand_occurrences(&entries);
        assert_eq!(dates.len(), 2 * MAX_OCCURRENCES_PER_ENTRY);
        assert_eq!(dates[0], day(2024, 3, 1));
        assert_eq!(dates[MAX_OCCURRENCES_PER_ENTRY], day(2024, 3, 2));
    }

    #[test]
    fn heatmap_defaults_to_latest_year() {
        let entries = [
            entry(2023, 12, 31, 1.0, "old"),
            entry(2024, 2, 1, 2.0, "new"),
        ];
        let refs: Vec<_> = entries.iter().collect();
        let input = HeatmapInput::from_entries(&refs, None).unwrap();
        assert_eq!(input.year, 2024);
        assert_eq!(input.dates, vec![day(2024, 2, 1), day(2024, 2, 1)]);

        let chosen = HeatmapInput::from_entries(&refs, Some(2023)).unwrap();
        assert_eq!(chosen.year, 2023);
        assert_eq!(chosen.dates, vec![day(2023, 12, 31)]);
    }

    #[test]
    fn heatmap_without_entries_needs_a_year() {
        assert_eq!(HeatmapInput::from_entries(&[], None), None);
        let input = HeatmapInput::from_entries(&[], Some(2022)).unwrap();
        assert!(input.dates.is_empty());
    }

    #[test]
    fn heatmap_serializes_plain_dates() {
        let entries = [entry(2024, 5, 6, 1.0, "x")];
        let refs: Vec<_> = entries.iter().collect();
        let json = serde_json::to_string(&HeatmapInput::from_entries(&refs, None).unwrap()).unwrap();
        assert_eq!(json, r#"{"year":2024,"dates":["2024-05-06"]}"#);
    }
}
