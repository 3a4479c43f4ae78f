/// Runtime configuration
///
/// Everything is read from `BOOKSHELF_*` environment variables. The lookup is
/// injectable so tests don't have to touch the process environment.

use crate::error::{BookshelfError, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DATABASE_URL: &str = "BOOKSHELF_DATABASE_URL";
pub const ENV_DB_USER: &str = "BOOKSHELF_DB_USER";
pub const ENV_DB_PASSWORD: &str = "BOOKSHELF_DB_PASSWORD";
pub const ENV_DRIVER_TIMEOUT_SECS: &str = "BOOKSHELF_DRIVER_TIMEOUT_SECS";
pub const ENV_ATOMIC_INSERT: &str = "BOOKSHELF_ATOMIC_INSERT";

const DEFAULT_DRIVER_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_DB_FILE: &str = "bookshelf.db";

/// Connection and behavior settings for one console session
#[derive(Clone)]
pub struct Config {
    pub connection_string: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Used as both the SQLite busy timeout and the connection acquire timeout
    pub driver_timeout: Duration,
    /// Wrap the book and review inserts in one transaction
    pub atomic_insert: bool,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let connection_string = get(ENV_DATABASE_URL).unwrap_or_else(default_connection_string);

        let driver_timeout = match get(ENV_DRIVER_TIMEOUT_SECS) {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_DRIVER_TIMEOUT,
        };

        let atomic_insert = match get(ENV_ATOMIC_INSERT) {
            Some(raw) => parse_bool(ENV_ATOMIC_INSERT, &raw)?,
            None => false,
        };

        Ok(Self {
            connection_string,
            username: get(ENV_DB_USER),
            password: get(ENV_DB_PASSWORD),
            driver_timeout,
            atomic_insert,
        })
    }

    /// Private in-memory database, used by tests
    pub fn in_memory() -> Self {
        Self {
            connection_string: "sqlite::memory:".to_string(),
            username: None,
            password: None,
            driver_timeout: DEFAULT_DRIVER_TIMEOUT,
            atomic_insert: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("connection_string", &self.connection_string)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("driver_timeout", &self.driver_timeout)
            .field("atomic_insert", &self.atomic_insert)
            .finish()
    }
}

fn default_connection_string() -> String {
    let path = dirs::data_dir()
        .map(|dir| dir.join("bookshelf").join(DEFAULT_DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
    format!("sqlite:{}", path.display())
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(BookshelfError::Config(format!(
            "{} must be a positive number of seconds, got '{}'",
            ENV_DRIVER_TIMEOUT_SECS, raw
        ))),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BookshelfError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, raw
        ))),
    }
}
