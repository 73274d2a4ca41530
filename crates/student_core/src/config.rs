//! Store configuration.
//!
//! # Responsibility
//! - Name the persistence unit and where its data lives.
//! - Resolve configuration from process environment for binaries.
//!
//! # Invariants
//! - A memory target is addressed by `unit_name`; two gateways with the same
//!   unit name in one process share data.

use crate::db::DEFAULT_BUSY_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_UNIT_NAME: &str = "student-store";

pub const ENV_UNIT: &str = "STUDENT_STORE_UNIT";
pub const ENV_PATH: &str = "STUDENT_STORE_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "STUDENT_STORE_BUSY_TIMEOUT_MS";

/// Where the store keeps its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// SQLite database file, created on first open.
    File(PathBuf),
    /// Named `memdb` in-memory database, dropped on gateway shutdown.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub unit_name: String,
    pub target: StoreTarget,
    pub busy_timeout: Duration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unit name cannot be empty")]
    EmptyUnitName,
    #[error("unit name `{0}` may only contain ASCII letters, digits, `-` and `_`")]
    InvalidUnitName(String),
    #[error("invalid STUDENT_STORE_BUSY_TIMEOUT_MS value `{0}`; expected milliseconds")]
    InvalidBusyTimeout(String),
}

impl StoreConfig {
    pub fn file(unit_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            unit_name: unit_name.into(),
            target: StoreTarget::File(path.into()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn in_memory(unit_name: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            target: StoreTarget::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Reads configuration from `STUDENT_STORE_*` environment variables.
    ///
    /// Missing `STUDENT_STORE_PATH` selects an in-memory store.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let unit_name = lookup(ENV_UNIT)
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| DEFAULT_UNIT_NAME.to_string());

        let mut config = match lookup(ENV_PATH).filter(|path| !path.trim().is_empty()) {
            Some(path) => Self::file(unit_name, path.trim()),
            None => Self::in_memory(unit_name),
        };

        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidBusyTimeout(raw.clone()))?;
            config.busy_timeout = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that the unit name is usable inside a SQLite URI.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unit_name.is_empty() {
            return Err(ConfigError::EmptyUnitName);
        }
        let valid = self
            .unit_name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(ConfigError::InvalidUnitName(self.unit_name.clone()));
        }
        Ok(())
    }

    pub(crate) fn mode(&self) -> &'static str {
        match self.target {
            StoreTarget::File(_) => "file",
            StoreTarget::Memory => "memory",
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_memory(DEFAULT_UNIT_NAME)
    }
}
