//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Time-tracking export importer.
///
/// Reads CSV, JSON, and ICS exports, normalizes them into one list of time
/// entries, and prepares calendar heatmap data.
#[derive(Debug, Parser)]
#[command(name = "tv", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import export files and list the normalized entries.
    Import {
        /// Files to import (.csv, .json, .ics).
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Import export files and print calendar heatmap data as JSON.
    Heatmap {
        /// Files to import (.csv, .json, .ics).
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Year to show (default: latest year in the data).
        #[arg(long)]
        year: Option<i32>,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

/// Entry selection shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Keep entries whose title, note, category, or tags contain this text.
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Minimum duration in hours (inclusive).
    #[arg(long)]
    pub min_hours: Option<f64>,

    /// Maximum duration in hours (inclusive).
    #[arg(long)]
    pub max_hours: Option<f64>,
}
