/// Error types for bookshelf
///
/// This module defines all possible errors that can occur in the application.
/// Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Main error type for bookshelf operations
#[derive(Error, Debug)]
pub enum BookshelfError {
    /// Database-related errors (connection, DDL, constraint violations)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O errors on the console streams
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value typed at the console could not be parsed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Insert succeeded but the database handed back no key
    #[error("Failed to retrieve generated book ID")]
    GeneratedKeyUnavailable,

    /// Standard input reached end of file
    #[error("Input stream closed")]
    InputClosed,

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for bookshelf operations
pub type Result<T> = std::result::Result<T, BookshelfError>;

/// Convert BookshelfError to a user-friendly error message
impl BookshelfError {
    pub fn user_message(&self) -> String {
        match self {
            BookshelfError::Database(e) => format!("Database error: {}", database_detail(e)),
            BookshelfError::Io(e) => {
                format!("Console I/O failed. Details: {}", e)
            }
            BookshelfError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
            BookshelfError::InvalidInput(reason) => {
                format!("Invalid input: {}", reason)
            }
            BookshelfError::GeneratedKeyUnavailable => {
                "Failed to retrieve generated book ID.".to_string()
            }
            BookshelfError::InputClosed => "Input closed.".to_string(),
            BookshelfError::Generic(msg) => msg.clone(),
        }
    }

    /// True when the database rejected a statement because of a constraint
    ///
    /// Covers foreign key, NOT NULL and CHECK failures.
    #[cfg(test)]
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            BookshelfError::Database(sqlx::Error::Database(db_err)) => !matches!(
                db_err.kind(),
                sqlx::error::ErrorKind::Other
            ),
            _ => false,
        }
    }

    /// True when the connection itself is unusable and the session must end
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            BookshelfError::Database(
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            )
        )
    }
}

// Driver errors carry a lot of wrapping; the console only needs the message.
fn database_detail(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    }
}
