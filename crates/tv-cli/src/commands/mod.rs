//! CLI subcommand implementations.

pub mod heatmap;
pub mod import;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tv_core::{TimeEntry, import_files};

use crate::Config;

/// Imports every file, reporting unreadable ones on stderr.
///
/// Fails only when files were given and none of them could be read.
fn load_entries(files: &[PathBuf], config: &Config) -> Result<Vec<TimeEntry>> {
    let options = config
        .import_options()
        .context("invalid utc_offset in configuration")?;
    let report = import_files(files, &options);
    tracing::debug!(
        files = files.len(),
        entries = report.entries.len(),
        failures = report.failures.len(),
        "import finished"
    );

    for failure in &report.failures {
        eprintln!("warning: {failure}");
    }
    if !files.is_empty() && report.failures.len() == files.len() {
        bail!("none of the {} file(s) could be imported", files.len());
    }
    Ok(report.entries)
}
