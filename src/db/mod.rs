/// Database module for bookshelf
///
/// Handles all database operations using SQLite and sqlx: the connection,
/// the Books/Reviews schema, and the record queries.

pub mod connection;
pub mod models;
pub mod queries;
pub mod schema;

pub use connection::Database;
pub use models::*;
