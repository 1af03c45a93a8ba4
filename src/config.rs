//! Configuration management for the voting system
//!
//! Loads configuration from environment variables (and a `.env` file if
//! present) with validation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

/// Default ballot, in display order
pub const DEFAULT_CANDIDATES: [&str; 3] = ["Candidate A", "Candidate B", "Candidate C"];

/// Default label of the abstention option
pub const DEFAULT_ABSTAIN_LABEL: &str = "Not Anyone";

/// Election rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// Candidates, in the order they appear on the ballot
    pub candidates: Vec<String>,

    /// Label of the extra "vote for nobody" option
    pub abstain_label: String,

    /// Minimum registration age (default: 18)
    pub min_age: u32,

    /// Draws allowed when looking for a free voter id (default: 100)
    pub max_id_attempts: u32,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES.iter().map(|c| c.to_string()).collect(),
            abstain_label: DEFAULT_ABSTAIN_LABEL.to_string(),
            min_age: 18,
            max_id_attempts: 100,
        }
    }
}

impl ElectionConfig {
    /// Check the ballot is usable
    pub fn validate(&self) -> Result<()> {
        if self.candidates.is_empty() {
            return Err(Error::config("at least one candidate is required"));
        }

        let mut seen = HashSet::new();
        for candidate in &self.candidates {
            if candidate.trim().is_empty() {
                return Err(Error::config("candidate names must not be blank"));
            }
            if !seen.insert(candidate.as_str()) {
                return Err(Error::config(format!("duplicate candidate: {candidate}")));
            }
        }

        if self.abstain_label.trim().is_empty() {
            return Err(Error::config("abstain label must not be blank"));
        }
        if seen.contains(self.abstain_label.as_str()) {
            return Err(Error::config(format!(
                "abstain label '{}' clashes with a candidate",
                self.abstain_label
            )));
        }

        if self.max_id_attempts == 0 {
            return Err(Error::config("EVOTE_MAX_ID_ATTEMPTS must be positive"));
        }

        Ok(())
    }
}

/// Which storage backend the session runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Everything is lost on exit
    Memory,
    /// Local SQLite database file
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::config(format!("unknown storage backend: {other}"))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file, only used by the SQLite backend
    pub path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub election: ElectionConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ElectionConfig::default();

        let candidates = match var("EVOTE_CANDIDATES") {
            Some(list) => list.split(',').map(|c| c.trim().to_string()).collect(),
            None => defaults.candidates,
        };

        let abstain_label = var("EVOTE_ABSTAIN_LABEL").unwrap_or(defaults.abstain_label);

        let min_age = var("EVOTE_MIN_AGE")
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|_| Error::config("Invalid EVOTE_MIN_AGE"))?
            .unwrap_or(defaults.min_age);

        let max_id_attempts = var("EVOTE_MAX_ID_ATTEMPTS")
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|_| Error::config("Invalid EVOTE_MAX_ID_ATTEMPTS"))?
            .unwrap_or(defaults.max_id_attempts);

        let election = ElectionConfig {
            candidates,
            abstain_label,
            min_age,
            max_id_attempts,
        };
        election.validate()?;

        let backend = var("EVOTE_STORAGE")
            .map(|v| v.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or(StorageBackend::Memory);

        let storage = StorageConfig {
            backend,
            path: var("EVOTE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("evote.db")),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "warn".to_string()),
            format: var("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
        };

        Ok(Self {
            election,
            storage,
            logging,
        })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self {
            election: ElectionConfig::default(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                path: PathBuf::from(":memory:"),
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
