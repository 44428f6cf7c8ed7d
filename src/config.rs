//! Service configuration.
//!
//! Defaults are overridden by a `.env` file in the working directory, which is
//! in turn overridden by real environment variables.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::db::get_db_path;
use crate::db::pool::DEFAULT_MAX_CONNECTIONS;
use crate::services::assignment::{
    AssignmentPolicy, DEFAULT_MAX_REVIEWERS, DEFAULT_REPLACEMENT_POOL_CAP,
};

pub const ENV_SERVER_PORT: &str = "SERVER_PORT";
pub const ENV_DATABASE_PATH: &str = "DATABASE_PATH";
pub const ENV_DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const ENV_MAX_REVIEWERS: &str = "MAX_REVIEWERS";
pub const ENV_REPLACEMENT_POOL_CAP: &str = "REPLACEMENT_POOL_CAP";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    MustBePositive { key: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_path: PathBuf,
    pub db_max_connections: u32,
    pub request_timeout_secs: u64,
    pub max_reviewers: usize,
    pub replacement_pool_cap: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 8080,
            database_path: get_db_path(Path::new("data")),
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
            request_timeout_secs: 30,
            max_reviewers: DEFAULT_MAX_REVIEWERS,
            replacement_pool_cap: DEFAULT_REPLACEMENT_POOL_CAP,
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("[config] Loaded {}", path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Missing keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = parse(&lookup, ENV_SERVER_PORT)? {
            config.server_port = port;
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(n) = parse(&lookup, ENV_DB_MAX_CONNECTIONS)? {
            config.db_max_connections = n;
        }
        if let Some(secs) = parse(&lookup, ENV_REQUEST_TIMEOUT_SECS)? {
            config.request_timeout_secs = secs;
        }
        if let Some(n) = parse(&lookup, ENV_MAX_REVIEWERS)? {
            config.max_reviewers = n;
        }
        if let Some(n) = parse(&lookup, ENV_REPLACEMENT_POOL_CAP)? {
            config.replacement_pool_cap = n;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_reviewers == 0 {
            return Err(ConfigError::MustBePositive {
                key: ENV_MAX_REVIEWERS,
            });
        }
        if self.replacement_pool_cap == 0 {
            return Err(ConfigError::MustBePositive {
                key: ENV_REPLACEMENT_POOL_CAP,
            });
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::MustBePositive {
                key: ENV_DB_MAX_CONNECTIONS,
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::MustBePositive {
                key: ENV_REQUEST_TIMEOUT_SECS,
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn assignment_policy(&self) -> AssignmentPolicy {
        AssignmentPolicy {
            max_reviewers: self.max_reviewers,
            replacement_pool_cap: self.replacement_pool_cap,
        }
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}
