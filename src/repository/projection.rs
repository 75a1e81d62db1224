//! Denormalized read model.
//!
//! A flat join of books, contributors and publishers is folded by book id into
//! [`FullEntry`] values, which are then flattened into `catalog_rows`. The row
//! for a book is rewritten in the same transaction as every write touching it.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    error::AppResult,
    models::{Book, DenormalizedRow, FullEntry, Person, Publisher},
};

/// Haystack field separator; keeps terms from matching across fields.
const SEARCH_SEPARATOR: &str = "\n";

const ENTRY_ROWS_SELECT: &str = r#"
    SELECT b.id AS book_id, b.isbn10, b.isbn13, b.title, b.year, b.shelf_mark,
           b.created_at, b.updated_at,
           c.role, p.id AS person_id, p.last_name, p.first_names,
           pub.id AS publisher_id, pub.name AS publisher_name, pub.location AS publisher_location
    FROM books b
    LEFT JOIN contributions c ON c.book_id = b.id
    LEFT JOIN persons p ON p.id = c.person_id
    LEFT JOIN publications bp ON bp.book_id = b.id
    LEFT JOIN publishers pub ON pub.id = bp.publisher_id
"#;

const ENTRY_ROWS_ORDER: &str = "ORDER BY b.id, c.role, c.position, c.person_id";

/// One book joined with at most one contributor
#[derive(Debug, Clone, FromRow)]
struct EntryRow {
    book_id: i64,
    isbn10: Option<String>,
    isbn13: Option<String>,
    title: Option<String>,
    year: Option<i32>,
    shelf_mark: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    role: Option<String>,
    person_id: Option<i64>,
    last_name: Option<String>,
    first_names: Option<String>,
    publisher_id: Option<i64>,
    publisher_name: Option<String>,
    publisher_location: Option<String>,
}

impl EntryRow {
    fn book(&self) -> Book {
        Book {
            id: Some(self.book_id),
            isbn10: self.isbn10.clone(),
            isbn13: self.isbn13.clone(),
            title: self.title.clone(),
            year: self.year,
            shelf_mark: self.shelf_mark.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn publisher(&self) -> Option<Publisher> {
        self.publisher_id.map(|id| Publisher {
            id: Some(id),
            name: self.publisher_name.clone(),
            location: self.publisher_location.clone(),
        })
    }

    fn person(&self) -> Option<Person> {
        self.person_id.map(|id| Person {
            id: Some(id),
            last_name: self.last_name.clone(),
            first_names: self.first_names.clone(),
        })
    }
}

/// Group rows ordered by book id (then role and position) into entries.
fn fold_entries(rows: Vec<EntryRow>) -> Vec<FullEntry> {
    rows.into_iter().fold(Vec::new(), |mut entries: Vec<FullEntry>, row| {
        let starts_new = entries.last().map_or(true, |e| e.book.id != Some(row.book_id));
        if starts_new {
            entries.push(FullEntry {
                book: row.book(),
                authors: Vec::new(),
                editors: Vec::new(),
                publisher: row.publisher(),
            });
        }

        if let (Some(entry), Some(person)) = (entries.last_mut(), row.person()) {
            match row.role.as_deref() {
                Some("author") => entry.authors.push(person),
                Some("editor") => entry.editors.push(person),
                _ => {}
            }
        }
        entries
    })
}

impl From<&FullEntry> for DenormalizedRow {
    fn from(entry: &FullEntry) -> Self {
        Self {
            id: entry.book.id.unwrap_or_default(),
            title: entry.book.title.clone(),
            authors: Person::join(&entry.authors),
            editors: Person::join(&entry.editors),
            publisher: entry
                .publisher
                .as_ref()
                .and_then(Publisher::display)
                .unwrap_or_default(),
            year: entry.book.year,
            shelf_mark: entry.book.shelf_mark.clone(),
        }
    }
}

/// A list row plus the derived columns used to sort and filter it
struct ProjectedRow {
    row: DenormalizedRow,
    year_key: i64,
    search_text: String,
}

impl ProjectedRow {
    fn new(row: DenormalizedRow) -> Self {
        let search_text = [
            row.title.as_deref().unwrap_or_default(),
            row.authors.as_str(),
            row.editors.as_str(),
            row.publisher.as_str(),
            row.shelf_mark.as_deref().unwrap_or_default(),
        ]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(SEARCH_SEPARATOR);

        Self {
            // Unset years sort before every real year.
            year_key: row.year.map(i64::from).unwrap_or(i64::MIN),
            search_text,
            row,
        }
    }
}

fn fold_key(value: Option<&str>) -> String {
    value.unwrap_or_default().to_lowercase()
}

#[derive(Clone, Default)]
pub struct Projection;

impl Projection {
    pub fn new() -> Self {
        Self
    }

    /// Load the nested entry of book `id`
    pub async fn load_entry(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Option<FullEntry>> {
        let sql = format!("{} WHERE b.id = ?1 {}", ENTRY_ROWS_SELECT, ENTRY_ROWS_ORDER);
        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;
        Ok(fold_entries(rows).into_iter().next())
    }

    /// Stored list row of book `id`
    pub async fn get_row(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Option<DenormalizedRow>> {
        let row = sqlx::query_as::<_, DenormalizedRow>(
            r#"
            SELECT book_id AS id, title, authors, editors, publisher, year, shelf_mark
            FROM catalog_rows
            WHERE book_id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Rebuild the list row of book `id` from its current relations.
    /// Returns `None` (and removes any stale row) if the book is gone.
    pub async fn refresh(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Option<DenormalizedRow>> {
        match self.load_entry(conn, id).await? {
            Some(entry) => {
                let row = DenormalizedRow::from(&entry);
                self.write_row(conn, ProjectedRow::new(row.clone())).await?;
                Ok(Some(row))
            }
            None => {
                sqlx::query("DELETE FROM catalog_rows WHERE book_id = ?1")
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
                Ok(None)
            }
        }
    }

    /// Rebuild every list row. Returns the number of rows written.
    pub async fn rebuild_all(&self, conn: &mut SqliteConnection) -> AppResult<usize> {
        let sql = format!("{} {}", ENTRY_ROWS_SELECT, ENTRY_ROWS_ORDER);
        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .fetch_all(&mut *conn)
            .await?;

        sqlx::query("DELETE FROM catalog_rows")
            .execute(&mut *conn)
            .await?;

        let entries = fold_entries(rows);
        for entry in &entries {
            self.write_row(conn, ProjectedRow::new(DenormalizedRow::from(entry)))
                .await?;
        }

        tracing::info!(rows = entries.len(), "Rebuilt catalog rows");
        Ok(entries.len())
    }

    async fn write_row(&self, conn: &mut SqliteConnection, projected: ProjectedRow) -> AppResult<()> {
        let row = &projected.row;
        sqlx::query(
            r#"
            INSERT INTO catalog_rows (
                book_id, title, authors, editors, publisher, year, shelf_mark,
                title_key, authors_key, editors_key, publisher_key, shelf_mark_key,
                year_key, search_text, search_key
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT (book_id) DO UPDATE SET
                title = excluded.title,
                authors = excluded.authors,
                editors = excluded.editors,
                publisher = excluded.publisher,
                year = excluded.year,
                shelf_mark = excluded.shelf_mark,
                title_key = excluded.title_key,
                authors_key = excluded.authors_key,
                editors_key = excluded.editors_key,
                publisher_key = excluded.publisher_key,
                shelf_mark_key = excluded.shelf_mark_key,
                year_key = excluded.year_key,
                search_text = excluded.search_text,
                search_key = excluded.search_key
            "#,
        )
        .bind(row.id)
        .bind(&row.title)
        .bind(&row.authors)
        .bind(&row.editors)
        .bind(&row.publisher)
        .bind(row.year)
        .bind(&row.shelf_mark)
        .bind(fold_key(row.title.as_deref()))
        .bind(row.authors.to_lowercase())
        .bind(row.editors.to_lowercase())
        .bind(row.publisher.to_lowercase())
        .bind(fold_key(row.shelf_mark.as_deref()))
        .bind(projected.year_key)
        .bind(&projected.search_text)
        .bind(projected.search_text.to_lowercase())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
