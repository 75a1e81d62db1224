//! Get-or-create resolution for entities identified by a natural key.
//!
//! Every resolution first tries to insert the candidate. When a unique index
//! rejects it, the existing row is looked up and its id returned; the
//! candidate's attributes are discarded, so the first writer of a key wins.

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    error::{AppError, AppResult},
    models::{Book, Person, Publisher},
};

/// Outcome of resolving a book by its ISBN pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBook {
    pub id: i64,
    /// False when an existing book with the same ISBN pair was reused.
    pub created: bool,
}

#[derive(Clone, Default)]
pub struct NaturalKeyStore;

impl NaturalKeyStore {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a person by `(last_name, first_names)`.
    pub async fn resolve_person(&self, conn: &mut SqliteConnection, person: &Person) -> AppResult<i64> {
        let person = person.normalized();
        if !person.has_natural_key() {
            return Err(AppError::Validation(
                "A person needs a last name or a first name".to_string(),
            ));
        }

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO persons (last_name, first_names) VALUES (?1, ?2)
            ON CONFLICT DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&person.last_name)
        .bind(&person.first_names)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(id) = inserted {
            tracing::debug!(id, "Created person {:?}", person.display());
            return Ok(id);
        }

        sqlx::query_scalar(
            r#"
            SELECT id FROM persons
            WHERE COALESCE(last_name, '') = COALESCE(?1, '')
              AND COALESCE(first_names, '') = COALESCE(?2, '')
            "#,
        )
        .bind(&person.last_name)
        .bind(&person.first_names)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!("Person {:?} could not be resolved", person.display()))
        })
    }

    /// Resolve a publisher by `(name, location)`.
    pub async fn resolve_publisher(
        &self,
        conn: &mut SqliteConnection,
        publisher: &Publisher,
    ) -> AppResult<i64> {
        let publisher = publisher.normalized();
        if !publisher.has_natural_key() {
            return Err(AppError::Validation(
                "A publisher needs a name or a location".to_string(),
            ));
        }

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO publishers (name, location) VALUES (?1, ?2)
            ON CONFLICT DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&publisher.name)
        .bind(&publisher.location)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(id) = inserted {
            tracing::debug!(id, "Created publisher {:?}", publisher.display());
            return Ok(id);
        }

        sqlx::query_scalar(
            r#"
            SELECT id FROM publishers
            WHERE COALESCE(name, '') = COALESCE(?1, '')
              AND COALESCE(location, '') = COALESCE(?2, '')
            "#,
        )
        .bind(&publisher.name)
        .bind(&publisher.location)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Publisher {:?} could not be resolved",
                publisher.display()
            ))
        })
    }

    /// Resolve a book by its `(isbn10, isbn13)` pair, inserting it with all of
    /// its scalar fields when the pair is new. Books without any ISBN are
    /// always inserted.
    pub async fn resolve_book(&self, conn: &mut SqliteConnection, book: &Book) -> AppResult<ResolvedBook> {
        let book = book.normalized();
        let now = Utc::now();

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO books (isbn10, isbn13, title, year, shelf_mark, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&book.isbn10)
        .bind(&book.isbn13)
        .bind(&book.title)
        .bind(book.year)
        .bind(&book.shelf_mark)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(id) = inserted {
            return Ok(ResolvedBook { id, created: true });
        }

        let existing: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM books
            WHERE COALESCE(isbn10, '') = COALESCE(?1, '')
              AND COALESCE(isbn13, '') = COALESCE(?2, '')
              AND (isbn10 IS NOT NULL OR isbn13 IS NOT NULL)
            "#,
        )
        .bind(&book.isbn10)
        .bind(&book.isbn13)
        .fetch_optional(&mut *conn)
        .await?;

        match existing {
            Some(id) => {
                tracing::info!(
                    id,
                    isbn10 = ?book.isbn10,
                    isbn13 = ?book.isbn13,
                    "Book already catalogued, keeping stored attributes"
                );
                Ok(ResolvedBook { id, created: false })
            }
            None => Err(AppError::Validation(
                "Book could not be resolved by its ISBN pair".to_string(),
            )),
        }
    }

    /// Delete persons and publishers no longer referenced by any book.
    pub async fn purge_orphans(&self, conn: &mut SqliteConnection) -> AppResult<u64> {
        let persons = sqlx::query(
            "DELETE FROM persons WHERE id NOT IN (SELECT person_id FROM contributions)",
        )
        .execute(&mut *conn)
        .await?
        .rows_affected();

        let publishers = sqlx::query(
            "DELETE FROM publishers WHERE id NOT IN (SELECT publisher_id FROM publications)",
        )
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if persons + publishers > 0 {
            tracing::debug!(persons, publishers, "Purged unreferenced persons and publishers");
        }

        Ok(persons + publishers)
    }
}
