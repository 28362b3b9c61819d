//! Merging of entries that describe the same activity on the same day.

use std::collections::HashMap;

use crate::entry::TimeEntry;

/// Collects entries keyed by [`TimeEntry::merge_key`].
///
/// The first entry seen for a key holds its position in the output. A later
/// entry with the same key replaces it only when its note is non-empty and
/// strictly longer than the stored note.
#[derive(Debug, Default)]
pub struct Deduplicator {
    entries: Vec<TimeEntry>,
    index: HashMap<String, usize>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers an entry; returns `true` if it was stored.
    pub fn insert(&mut self, entry: TimeEntry) -> bool {
        let key = entry.merge_key();
        match self.index.get(&key).copied() {
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
                true
            }
            Some(idx) => {
                let existing = &self.entries[idx];
                let richer = !entry.note.is_empty()
                    && entry.note.chars().count() > existing.note.chars().count();
                if richer {
                    tracing::trace!(key = %key, "replacing entry with richer note");
                    self.entries[idx] = entry;
                }
                richer
            }
        }
    }

    /// The merged entries, in order of first appearance.
    pub fn into_entries(self) -> Vec<TimeEntry> {
        self.entries
    }
}

impl Extend<TimeEntry> for Deduplicator {
    fn extend<I: IntoIterator<Item = TimeEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.insert(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    fn entry(day: u32, title: &str, note: &str) -> TimeEntry {
        TimeEntry::new(NaiveDate::from_ymd_opt(2024, 5, day).unwrap(), 1.0, title).with_note(note)
    }

    #[test]
    fn longer_note_replaces_whole_record() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.insert(entry(1, "Gym", "legs").with_category("health")));
        assert!(dedup.insert(entry(1, "Gym", "legs and back")));

        let entries = dedup.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].note, "legs and back");
        assert_eq!(entries[0].category, "");
    }

    #[test]
    fn shorter_equal_or_empty_note_keeps_first() {
        let mut dedup = Deduplicator::new();
        dedup.insert(entry(1, "Gym", "legs"));
        assert!(!dedup.insert(entry(1, "Gym", "arms")));
        assert!(!dedup.insert(entry(1, "Gym", "abs")));
        assert!(!dedup.insert(entry(1, "Gym", "")));
        assert_eq!(dedup.into_entries()[0].note, "legs");
    }

    #[test]
    fn note_length_counts_characters() {
        let mut dedup = Deduplicator::new();
        dedup.insert(entry(1, "读书", "abcd"));
        // Three characters but nine bytes.
        assert!(!dedup.insert(entry(1, "读书", "很好看")));
    }

    #[test]
    fn distinct_keys_keep_first_seen_order() {
        let mut dedup = Deduplicator::new();
        dedup.extend([
            entry(2, "B", ""),
            entry(1, "A", ""),
            entry(2, "B", "now with a note"),
            entry(2, "C", ""),
        ]);
        let entries = dedup.into_entries();
        assert_eq!(entries.len(), 3);
        let titles: Vec<_> = entries
            .into_iter()
            .map(|e| (e.date.to_string(), e.title, e.note))
            .collect();
        assert_eq!(
            titles,
            vec![
                ("2024-05-02".into(), "B".into(), "now with a note".into()),
                ("2024-05-01".into(), "A".into(), String::new()),
                ("2024-05-02".into(), "C".into(), String::new()),
            ]
        );
    }
}
