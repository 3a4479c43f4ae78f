/// Data models for database entities
///
/// All models map to database tables and use sqlx for type-safe queries.

use sqlx::FromRow;
use std::fmt;

/// A row of the Books table
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Book {
    pub book_id: i64,
    pub title: String,
    pub author: String,
}

/// A row of the Reviews table
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Review {
    pub review_id: i64,
    pub book_id: i64,
    pub review_text: String,
    pub reviewer_name: String,
}

/// Input for the combined book + review insert
#[derive(Debug, Clone)]
pub struct BookReviewInput {
    pub title: String,
    pub author: String,
    pub review_text: String,
    pub reviewer_name: String,
}

/// Keys generated by a successful book + review insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedRecord {
    pub book_id: i64,
    pub review_id: i64,
}

/// One row of the Books/Reviews join
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BookReview {
    pub title: String,
    pub author: String,
    pub review_text: String,
    pub reviewer_name: String,
}

impl fmt::Display for BookReview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} - Review by {}: \"{}\"",
            self.title, self.author, self.reviewer_name, self.review_text
        )
    }
}

/// Tables owned by the schema manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Books,
    Reviews,
}

impl Table {
    /// Name as stored in the catalog
    pub fn name(&self) -> &'static str {
        match self {
            Table::Books => "Books",
            Table::Reviews => "Reviews",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What a schema reset actually touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaChanges {
    pub dropped: Vec<Table>,
    pub created: Vec<Table>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_review_display() {
        let row = BookReview {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            review_text: "Great read".to_string(),
            reviewer_name: "Alice".to_string(),
        };

        assert_eq!(
            row.to_string(),
            "Dune by Herbert - Review by Alice: \"Great read\""
        );
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Table::Books.to_string(), "Books");
        assert_eq!(Table::Reviews.name(), "Reviews");
    }
}
