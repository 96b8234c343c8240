//! Runtime configuration for the grail engine and its stores.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::record::NOTE_DELIMITER;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrailConfig {
    /// Directory holding one JSON document per account.
    pub data_dir: PathBuf,
    /// Trailing window used by site statistics.
    pub stats_window_days: u32,
    /// Separator placed between member notes in a party view.
    pub note_delimiter: String,
    /// Largest roster a leader may build. `None` means unbounded.
    pub max_party_size: Option<usize>,
}

impl GrailConfig {
    const fn default_stats_window_days() -> u32 {
        7
    }

    fn default_data_dir() -> PathBuf {
        PathBuf::from("grail-data")
    }

    /// Parse and validate a JSON config document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first field found out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stats_window_days == 0 {
            return Err(ConfigError::MinViolation {
                field: "stats_window_days",
                min: 1,
                value: 0,
            });
        }
        if self.note_delimiter.is_empty() {
            return Err(ConfigError::Empty {
                field: "note_delimiter",
            });
        }
        if self.max_party_size == Some(0) {
            return Err(ConfigError::MinViolation {
                field: "max_party_size",
                min: 1,
                value: 0,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn stats_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.stats_window_days))
    }
}

impl Default for GrailConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            stats_window_days: Self::default_stats_window_days(),
            note_delimiter: NOTE_DELIMITER.to_string(),
            max_party_size: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}
