/// Database connection management
///
/// Holds the single SQLite connection used for the whole console session.

use crate::config::Config;
use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;
use tracing::{debug, info};

/// The console is single-user; one connection is all it ever needs.
const MAX_CONNECTIONS: u32 = 1;

/// Database wrapper around a one-connection pool
///
/// The connection is opened by [`Database::connect`] and lives until
/// [`Database::close`] is called or the last clone is dropped.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database described by `config`
    ///
    /// # Arguments
    /// * `config` - Connection string, credentials and driver timeout
    ///
    /// # Returns
    /// * `Ok(Database)` - Connection established with foreign keys enforced
    /// * `Err(BookshelfError)` - If the URL is malformed or the connection fails
    ///
    /// # Examples
    /// ```no_run
    /// use bookshelf_lib::{Config, Database};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::connect(&Config::from_env()?).await?;
    /// db.close().await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: &Config) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.connection_string)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(config.driver_timeout)
            .disable_statement_logging();

        // Create parent directory if it doesn't exist
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        if config.username.is_some() || config.password.is_some() {
            debug!("sqlite has no authentication, ignoring configured credentials");
        }

        // An in-memory database disappears with its connection, so the one
        // connection must never be reaped or recycled.
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .min_connections(MAX_CONNECTIONS)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(config.driver_timeout)
            .connect_with(options)
            .await?;

        info!(url = %config.connection_string, "database connection opened");

        Ok(Self { pool })
    }

    /// Create a fresh in-memory database for a test
    #[cfg(test)]
    pub async fn new_test() -> Result<Self> {
        Self::connect(&Config::in_memory()).await
    }

    /// Get reference to the connection pool
    ///
    /// Used internally by query modules.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection
    ///
    /// Should be called on application shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("database connection closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_creation() {
        let db = Database::new_test().await;
        assert!(db.is_ok());
    }

    #[tokio::test]
    async fn test_single_connection() {
        let db = Database::new_test().await.unwrap();
        assert_eq!(db.pool().size(), 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::new_test().await.unwrap();

        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();

        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("books.db");
        let config = Config {
            connection_string: format!("sqlite:{}", path.display()),
            ..Config::in_memory()
        };

        let db = Database::connect(&config).await.unwrap();
        db.close().await;

        assert!(path.exists());
        assert!(db.is_closed());
    }

    #[tokio::test]
    async fn test_unusable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let config = Config {
            connection_string: format!("sqlite:{}", blocker.join("books.db").display()),
            ..Config::in_memory()
        };

        assert!(Database::connect(&config).await.is_err());
    }
}
