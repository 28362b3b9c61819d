//! Implementation of the `tv heatmap` command.

use std::path::PathBuf;

use anyhow::{Result, bail};
use tv_core::HeatmapInput;

use crate::Config;
use crate::cli::FilterArgs;

/// Formats the heatmap payload as pretty-printed JSON.
pub fn format_heatmap(input: &HeatmapInput) -> Result<String> {
    Ok(serde_json::to_string_pretty(input)?)
}

/// Runs the heatmap command.
pub fn run(
    files: &[PathBuf],
    year: Option<i32>,
    filter: &FilterArgs,
    config: &Config,
) -> Result<()> {
    let entries = super::load_entries(files, config)?;
    let selected = config.filter(filter).apply(&entries);

    let Some(input) = HeatmapInput::from_entries(&selected, year) else {
        bail!("no entries matched; pass --year to emit an empty heatmap");
    };
    tracing::debug!(year = input.year, occurrences = input.dates.len(), "built heatmap");

    println!("{}", format_heatmap(&input)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use insta::assert_snapshot;
    use tv_core::TimeEntry;

    fn entry(y: i32, m: u32, d: u32, hours: f64) -> TimeEntry {
        TimeEntry::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), hours, "Work")
    }

    #[test]
    fn test_format_heatmap_expands_hours() {
        let entries = [entry(2023, 12, 30, 3.0), entry(2024, 1, 15, 1.5), entry(2024, 1, 16, 0.1)];
        let refs: Vec<_> = entries.iter().collect();
        let input = HeatmapInput::from_entries(&refs, None).unwrap();

        assert_snapshot!(format_heatmap(&input).unwrap(), @r#"
        {
          "year": 2024,
          "dates": [
            "2024-01-15",
            "2024-01-15",
            "2024-01-16"
          ]
        }
        "#);
    }

    #[test]
    fn test_format_heatmap_empty_year() {
        let input = HeatmapInput::from_entries(&[], Some(2022)).unwrap();
        assert_snapshot!(format_heatmap(&input).unwrap(), @r#"
        {
          "year": 2022,
          "dates": []
        }
        "#);
    }
}
