//! Implementation of the `tv import` command.
//!
//! Imports export files and lists the normalized entries that pass the
//! keyword and duration filters.

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::Result;
use tv_core::TimeEntry;

use crate::Config;
use crate::cli::FilterArgs;

// ========== Text Output ==========

/// Formats entries one per line: `YYYY-MM-DD  1.50h  Title [tags]`.
pub fn format_entries(entries: &[&TimeEntry]) -> String {
    let mut output = String::new();

    if entries.is_empty() {
        writeln!(output, "No entries found.").unwrap();
        return output;
    }

    for entry in entries {
        write!(
            output,
            "{}  {:.2}h  {}",
            entry.date.format("%Y-%m-%d"),
            entry.duration,
            entry.title
        )
        .unwrap();
        if !entry.tags.is_empty() {
            write!(output, " [{}]", entry.tags.join(", ")).unwrap();
        }
        writeln!(output).unwrap();
    }

    let total: f64 = entries.iter().map(|entry| entry.duration).sum();
    writeln!(output).unwrap();
    writeln!(output, "{} entries, {total:.2}h total", entries.len()).unwrap();

    output
}

// ========== JSON Output ==========

/// Formats entries as a pretty-printed JSON array.
pub fn format_entries_json(entries: &[&TimeEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

// ========== Public Interface ==========

/// Runs the import command.
pub fn run(files: &[PathBuf], filter: &FilterArgs, json: bool, config: &Config) -> Result<()> {
    let entries = super::load_entries(files, config)?;
    let filter = config.filter(filter);
    let selected = filter.apply(&entries);
    tracing::debug!(
        total = entries.len(),
        selected = selected.len(),
        "filtered entries"
    );

    if json {
        let output = format_entries_json(&selected)?;
        println!("{output}");
    } else {
        let output = format_entries(&selected);
        print!("{output}");
    }

    Ok(())
}
