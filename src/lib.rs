/// bookshelf library
///
/// Books and reviews in SQLite behind an interactive text menu.

pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::Config;
pub use console::Console;
pub use db::Database;
pub use error::{BookshelfError, Result};
