//! Runtime configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults:
//!
//! | Variable                       | Default          |
//! |--------------------------------|------------------|
//! | `TALLYBOOK_DATABASE_PATH`      | `./tallybook.db` |
//! | `TALLYBOOK_MAX_CONNECTIONS`    | `5`              |
//! | `TALLYBOOK_LOCK_TIMEOUT_SECS`  | `30`             |
//! | `TALLYBOOK_DEFERRED_KEYWORDS`  | `credit,crédito` |
//! | `TALLYBOOK_DEFERRAL_DAYS`      | `30`             |
//! | `TALLYBOOK_UTC_OFFSET`         | `+00:00`         |

use chrono::FixedOffset;
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tallybook_core::settlement::{DEFAULT_DEFERRAL_DAYS, DEFAULT_DEFERRED_KEYWORDS};
use tallybook_core::SettlementPolicy;

use crate::pool::DbConfig;

pub const ENV_DATABASE_PATH: &str = "TALLYBOOK_DATABASE_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "TALLYBOOK_MAX_CONNECTIONS";
pub const ENV_LOCK_TIMEOUT_SECS: &str = "TALLYBOOK_LOCK_TIMEOUT_SECS";
pub const ENV_DEFERRED_KEYWORDS: &str = "TALLYBOOK_DEFERRED_KEYWORDS";
pub const ENV_DEFERRAL_DAYS: &str = "TALLYBOOK_DEFERRAL_DAYS";
pub const ENV_UTC_OFFSET: &str = "TALLYBOOK_UTC_OFFSET";

/// Engine configuration.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Pool size.
    pub max_connections: u32,

    /// How long a transaction waits for another one's write lock.
    pub lock_timeout: Duration,

    /// Payment-method name fragments that mean "paid on credit terms".
    pub deferred_keywords: Vec<String>,

    /// Days until a deferred sale's money arrives.
    pub deferral_days: u32,

    /// Business timezone as a fixed UTC offset.
    #[serde(serialize_with = "serialize_offset")]
    pub utc_offset: FixedOffset,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = AppConfig {
            database_path: PathBuf::from(
                lookup(ENV_DATABASE_PATH).unwrap_or_else(|| "./tallybook.db".to_string()),
            ),

            max_connections: parse_or(&lookup, ENV_MAX_CONNECTIONS, 5)?,

            lock_timeout: Duration::from_secs(parse_or(&lookup, ENV_LOCK_TIMEOUT_SECS, 30)?),

            deferred_keywords: match lookup(ENV_DEFERRED_KEYWORDS) {
                Some(raw) => raw
                    .split(',')
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
                None => DEFAULT_DEFERRED_KEYWORDS
                    .iter()
                    .map(|k| k.to_string())
                    .collect(),
            },

            deferral_days: parse_or(&lookup, ENV_DEFERRAL_DAYS, DEFAULT_DEFERRAL_DAYS)?,

            utc_offset: match lookup(ENV_UTC_OFFSET) {
                Some(raw) => FixedOffset::from_str(raw.trim())
                    .map_err(|_| ConfigError::InvalidValue(ENV_UTC_OFFSET.to_string()))?,
                None => FixedOffset::east_opt(0)
                    .ok_or_else(|| ConfigError::InvalidValue(ENV_UTC_OFFSET.to_string()))?,
            },
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()));
        }

        Ok(config)
    }

    /// Pool configuration for [`crate::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .lock_timeout(self.lock_timeout)
    }

    /// Settlement rules for the sale processor.
    pub fn settlement_policy(&self) -> SettlementPolicy {
        SettlementPolicy::default()
            .with_keywords(&self.deferred_keywords)
            .with_deferral_days(self.deferral_days)
            .with_utc_offset(self.utc_offset)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn serialize_offset<S: serde::Serializer>(offset: &FixedOffset, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&offset.to_string())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
