//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tv_core::filter::{DEFAULT_MAX_HOURS, DEFAULT_MIN_HOURS};
use tv_core::{EntryFilter, ImportError, ImportOptions, parse_utc_offset};

use crate::cli::FilterArgs;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Local zone offset that calendar days are taken in, e.g. `+08:00`.
    pub utc_offset: String,

    /// Default lower bound of the duration filter, in hours.
    pub min_hours: f64,

    /// Default upper bound of the duration filter, in hours.
    pub max_hours: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            utc_offset: "+08:00".to_string(),
            min_hours: DEFAULT_MIN_HOURS,
            max_hours: DEFAULT_MAX_HOURS,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // TV_UTC_OFFSET, TV_MIN_HOURS, ...
        figment = figment.merge(Env::prefixed("TV_"));

        figment.extract()
    }

    /// Parser settings derived from this configuration.
    pub fn import_options(&self) -> Result<ImportOptions, ImportError> {
        Ok(ImportOptions {
            local_offset: parse_utc_offset(&self.utc_offset)?,
        })
    }

    /// The entry filter, with command-line values taking precedence.
    pub fn filter(&self, args: &FilterArgs) -> EntryFilter {
        let filter = EntryFilter::default().with_range(
            args.min_hours.unwrap_or(self.min_hours),
            args.max_hours.unwrap_or(self.max_hours),
        );
        match &args.keyword {
            Some(keyword) => filter.with_keyword(keyword.as_str()),
            None => filter,
        }
    }
}

/// Returns the platform-specific config directory for tv.
///
/// On Linux: `~/.config/tv`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tv"))
}
