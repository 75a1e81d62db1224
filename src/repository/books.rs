//! Books repository: placeholder creation, scalar updates and cascading deletes

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::Book,
};

#[derive(Clone, Default)]
pub struct BooksRepository;

impl BooksRepository {
    pub fn new() -> Self {
        Self
    }

    /// Insert a book with every scalar field unset
    pub async fn create_placeholder(&self, conn: &mut SqliteConnection) -> AppResult<i64> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO books (created_at, updated_at) VALUES (?1, ?1) RETURNING id",
        )
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }

    pub async fn get(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, isbn10, isbn13, title, year, shelf_mark, created_at, updated_at
            FROM books
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(book)
    }

    pub async fn exists(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists != 0)
    }

    /// Overwrite the scalar fields of book `id`. Returns false if it does not exist.
    ///
    /// Moving a book onto an ISBN pair already used by another book is a conflict.
    pub async fn update_scalars(&self, conn: &mut SqliteConnection, id: i64, book: &Book) -> AppResult<bool> {
        let book = book.normalized();
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE books SET
                isbn10 = ?1,
                isbn13 = ?2,
                title = ?3,
                year = ?4,
                shelf_mark = ?5,
                updated_at = ?6
            WHERE id = ?7
            "#,
        )
        .bind(&book.isbn10)
        .bind(&book.isbn13)
        .bind(&book.title)
        .bind(book.year)
        .bind(&book.shelf_mark)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Another book already has this ISBN pair".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete book `id`; contributions, publication and its list row cascade.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
