/// Schema management for the Books and Reviews tables
///
/// Every create/drop is preceded by a catalog lookup, so a reset works from
/// any starting state without relying on DDL failures.

use crate::db::models::{SchemaChanges, Table};
use crate::db::Database;
use crate::error::Result;
use tracing::info;

const BOOKS_DDL: &str = include_str!("../../database/books.sql");
const REVIEWS_DDL: &str = include_str!("../../database/reviews.sql");

/// Creation order. Drops run in reverse so Reviews goes before the table it references.
const TABLES: [Table; 2] = [Table::Books, Table::Reviews];

impl Table {
    fn create_sql(&self) -> &'static str {
        match self {
            Table::Books => BOOKS_DDL,
            Table::Reviews => REVIEWS_DDL,
        }
    }

    fn drop_sql(&self) -> &'static str {
        match self {
            Table::Books => "DROP TABLE Books",
            Table::Reviews => "DROP TABLE Reviews",
        }
    }
}

impl Database {
    /// Check the catalog for a table
    pub async fn table_exists(&self, table: Table) -> Result<bool> {
        let (exists,): (i64,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE)",
        )
        .bind(table.name())
        .fetch_one(self.pool())
        .await?;

        Ok(exists != 0)
    }

    /// Drop Reviews then Books, skipping any that don't exist
    ///
    /// # Returns
    /// * `Ok(Vec<Table>)` - The tables that were actually dropped, in order
    pub async fn drop_tables(&self) -> Result<Vec<Table>> {
        let mut dropped = Vec::new();

        for table in TABLES.iter().rev() {
            if self.table_exists(*table).await? {
                sqlx::query(table.drop_sql()).execute(self.pool()).await?;
                info!(table = table.name(), "dropped table");
                dropped.push(*table);
            }
        }

        Ok(dropped)
    }

    /// Create Books then Reviews, skipping any that already exist
    ///
    /// # Returns
    /// * `Ok(Vec<Table>)` - The tables that were actually created, in order
    pub async fn create_tables(&self) -> Result<Vec<Table>> {
        let mut created = Vec::new();

        for table in TABLES {
            if !self.table_exists(table).await? {
                sqlx::query(table.create_sql()).execute(self.pool()).await?;
                info!(table = table.name(), "created table");
                created.push(table);
            }
        }

        Ok(created)
    }

    /// Drop both tables and recreate them empty
    pub async fn reset_schema(&self) -> Result<SchemaChanges> {
        let dropped = self.drop_tables().await?;
        let created = self.create_tables().await?;

        Ok(SchemaChanges { dropped, created })
    }
}
