//! Runtime configuration from environment variables.
//!
//! - `BIOMARK_DB_PATH`: database file, default `biomark.sqlite3`.
//! - `BIOMARK_LOG_LEVEL`: `trace|debug|info|warn|error`, default per build mode.
//! - `BIOMARK_LOG_DIR`: absolute directory for rolling logs; unset disables
//!   file logging.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "BIOMARK_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "BIOMARK_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "BIOMARK_LOG_DIR";

const DEFAULT_DB_PATH: &str = "biomark.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let db_path = non_blank(DB_PATH_VAR)
            .map(|value| PathBuf::from(value.trim()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let log_level = match non_blank(LOG_LEVEL_VAR) {
            Some(value) => {
                normalize_level(&value).map_err(|reason| ConfigError::Invalid(LOG_LEVEL_VAR, reason))?
            }
            None => default_log_level(),
        };

        let log_dir = non_blank(LOG_DIR_VAR)
            .map(|value| normalize_log_dir(&value))
            .transpose()
            .map_err(|reason| ConfigError::Invalid(LOG_DIR_VAR, reason))?;

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid(&'static str, String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(var, reason) => write!(f, "invalid value for {var}: {reason}"),
        }
    }
}

impl Error for ConfigError {}
