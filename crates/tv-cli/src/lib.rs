//! Time-tracking export importer CLI library.
//!
//! This crate provides the CLI interface over `tv-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, FilterArgs};
pub use config::Config;
