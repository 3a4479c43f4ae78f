/// SQL query functions for database operations
///
/// Every statement binds its values; nothing typed at the console is ever
/// spliced into SQL text.

use crate::db::models::*;
use crate::db::Database;
use crate::error::{BookshelfError, Result};
use sqlx::{Row, SqliteConnection};
use tracing::{debug, warn};

impl Database {
    /// Insert a book and return its generated id
    ///
    /// # Returns
    /// * `Ok(i64)` - The generated `book_id`
    /// * `Err(BookshelfError::GeneratedKeyUnavailable)` - If the insert returned no key
    pub async fn insert_book(&self, title: &str, author: &str) -> Result<i64> {
        let mut conn = self.pool().acquire().await?;
        insert_book_on(&mut conn, title, author).await
    }

    /// Insert a review for an existing book and return its generated id
    ///
    /// Fails with a foreign key violation if `book_id` does not exist.
    pub async fn insert_review(
        &self,
        book_id: i64,
        review_text: &str,
        reviewer_name: &str,
    ) -> Result<i64> {
        let mut conn = self.pool().acquire().await?;
        insert_review_on(&mut conn, book_id, review_text, reviewer_name).await
    }

    /// Insert a book and then its first review, as two independent statements
    ///
    /// Not atomic: if the review insert fails the book row stays behind with
    /// no review. Use [`Database::insert_book_with_review_atomic`] to avoid that.
    ///
    /// # Arguments
    /// * `input` - Book and review fields
    ///
    /// # Returns
    /// * `Ok(InsertedRecord)` - Both generated ids
    /// * `Err(BookshelfError)` - If either insert fails or no key comes back
    pub async fn insert_book_with_review(&self, input: &BookReviewInput) -> Result<InsertedRecord> {
        let mut conn = self.pool().acquire().await?;

        let book_id = insert_book_on(&mut conn, &input.title, &input.author).await?;

        match insert_review_on(&mut conn, book_id, &input.review_text, &input.reviewer_name).await {
            Ok(review_id) => Ok(InsertedRecord { book_id, review_id }),
            Err(err) => {
                warn!(book_id, "review insert failed, book row left without a review");
                Err(err)
            }
        }
    }

    /// Insert a book and its first review inside one transaction
    ///
    /// Any failure rolls back both rows.
    pub async fn insert_book_with_review_atomic(
        &self,
        input: &BookReviewInput,
    ) -> Result<InsertedRecord> {
        let mut tx = self.pool().begin().await?;

        let book_id = insert_book_on(&mut tx, &input.title, &input.author).await?;
        let review_id =
            insert_review_on(&mut tx, book_id, &input.review_text, &input.reviewer_name).await?;

        tx.commit().await?;

        Ok(InsertedRecord { book_id, review_id })
    }

    /// Delete a review by id
    ///
    /// # Returns
    /// * `Ok(0)` - No review with that id
    /// * `Ok(1)` - Review removed
    pub async fn delete_review(&self, review_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM Reviews WHERE review_id = ?")
            .bind(review_id)
            .execute(self.pool())
            .await?;

        let affected = result.rows_affected();
        debug!(review_id, affected, "delete review");
        Ok(affected)
    }

    /// Replace a book's title and author
    ///
    /// # Returns
    /// * `Ok(0)` - No book with that id
    /// * `Ok(1)` - Book updated
    pub async fn update_book(&self, book_id: i64, title: &str, author: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE Books SET title = ?, author = ? WHERE book_id = ?")
            .bind(title)
            .bind(author)
            .bind(book_id)
            .execute(self.pool())
            .await?;

        let affected = result.rows_affected();
        debug!(book_id, affected, "update book");
        Ok(affected)
    }

    /// List every review joined with its book
    ///
    /// Inner join with no ordering: books that have no reviews never show up
    /// here, and row order is whatever SQLite returns.
    pub async fn list_book_reviews(&self) -> Result<Vec<BookReview>> {
        let rows = sqlx::query_as::<_, BookReview>(
            r#"
            SELECT b.title, b.author, r.review_text, r.reviewer_name
            FROM Books b
            JOIN Reviews r ON b.book_id = r.book_id
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        debug!(rows = rows.len(), "list book reviews");
        Ok(rows)
    }

    /// Get a book by id
    #[cfg(test)]
    pub async fn get_book(&self, book_id: i64) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM Books WHERE book_id = ?")
            .bind(book_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(book)
    }

    /// Get all reviews of a book
    #[cfg(test)]
    pub async fn get_reviews_for_book(&self, book_id: i64) -> Result<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM Reviews WHERE book_id = ? ORDER BY review_id",
        )
        .bind(book_id)
        .fetch_all(self.pool())
        .await?;

        Ok(reviews)
    }
}

async fn insert_book_on(conn: &mut SqliteConnection, title: &str, author: &str) -> Result<i64> {
    // fetch_all steps the statement to completion before the next one starts
    let rows = sqlx::query("INSERT INTO Books (title, author) VALUES (?, ?) RETURNING book_id")
        .bind(title)
        .bind(author)
        .fetch_all(&mut *conn)
        .await?;

    match rows.into_iter().next() {
        Some(row) => {
            let book_id: i64 = row.try_get(0)?;
            debug!(book_id, "inserted book");
            Ok(book_id)
        }
        None => {
            warn!("book insert returned no generated key");
            Err(BookshelfError::GeneratedKeyUnavailable)
        }
    }
}

async fn insert_review_on(
    conn: &mut SqliteConnection,
    book_id: i64,
    review_text: &str,
    reviewer_name: &str,
) -> Result<i64> {
    let rows = sqlx::query(
        "INSERT INTO Reviews (book_id, review_text, reviewer_name) VALUES (?, ?, ?) RETURNING review_id",
    )
    .bind(book_id)
    .bind(review_text)
    .bind(reviewer_name)
    .fetch_all(&mut *conn)
    .await?;

    let row = rows.into_iter().next().ok_or_else(|| {
        BookshelfError::Generic(format!("review insert for book {} returned no key", book_id))
    })?;
    let review_id: i64 = row.try_get(0)?;
    debug!(book_id, review_id, "inserted review");
    Ok(review_id)
}
