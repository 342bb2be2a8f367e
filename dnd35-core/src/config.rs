//! Runtime configuration.

use crate::actions::DEFAULT_HISTORY_CAPACITY;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DATA_DIR_VAR: &str = "DND35_DATA_DIR";
pub const AUTOSAVE_SECS_VAR: &str = "DND35_AUTOSAVE_SECS";
pub const ROLL_HISTORY_VAR: &str = "DND35_ROLL_HISTORY";

/// Default delay between an edit and its auto-save.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Configuration for storage location, auto-save and roll history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dnd35Config {
    /// Directory holding the storage buckets.
    pub data_dir: PathBuf,

    /// How long after an edit the auto-save fires.
    pub autosave_delay: Duration,

    /// Number of rolls kept in the roll history.
    pub roll_history: usize,
}

impl Default for Dnd35Config {
    fn default() -> Self {
        Self::new("dnd35-data")
    }
}

impl Dnd35Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            roll_history: DEFAULT_HISTORY_CAPACITY,
        }
    }

    pub fn with_autosave_delay(mut self, delay: Duration) -> Self {
        self.autosave_delay = delay;
        self
    }

    pub fn with_roll_history(mut self, capacity: usize) -> Self {
        self.roll_history = capacity;
        self
    }

    /// Load from `DND35_DATA_DIR`, `DND35_AUTOSAVE_SECS` and
    /// `DND35_ROLL_HISTORY`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup(DATA_DIR_VAR).filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup(AUTOSAVE_SECS_VAR) {
            config.autosave_delay = Duration::from_secs(parse_number(AUTOSAVE_SECS_VAR, &secs)?);
        }
        if let Some(capacity) = lookup(ROLL_HISTORY_VAR) {
            config.roll_history = parse_number(ROLL_HISTORY_VAR, &capacity)? as usize;
        }
        Ok(config)
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        })
}
