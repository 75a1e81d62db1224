//! Catalog management service
//!
//! A save resolves natural keys, synchronizes both contributor roles and the
//! publication, updates the book's scalar fields and rebuilds its list row as
//! one transaction. Write transactions run one at a time, so concurrent saves
//! of the same book are last-writer-wins.

use crate::{
    error::{AppError, AppResult},
    models::{
        ContributorRole, DenormalizedRow, FullEntry, Page, PageRequest, Person, SaveOutcome,
        SaveResponse, ViewState,
    },
    repository::Repository,
};

/// A page fetched to bring a just-written row into view
#[derive(Debug, Clone)]
pub struct RevealedPage {
    pub page: Page,
    /// False when the row was missing or filtered out and the first page was used.
    pub located: bool,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a placeholder book with every field unset and return its list row
    pub async fn create_empty_entry(&self) -> AppResult<DenormalizedRow> {
        let (_writer, mut tx) = self.repository.begin_write().await?;

        let id = self.repository.books.create_placeholder(&mut *tx).await?;
        let row = self
            .repository
            .projection
            .refresh(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Placeholder {} vanished", id)))?;

        tx.commit().await?;
        tracing::info!(id, "Created empty catalog entry");
        Ok(row)
    }

    /// Create or update a full entry.
    ///
    /// Without a book id the book is resolved by its ISBN pair; a match means
    /// the book is already catalogued and the submission is discarded.
    pub async fn save_entry(&self, entry: FullEntry) -> AppResult<SaveResponse> {
        let repo = &self.repository;
        let book = entry.book.normalized();
        let (_writer, mut tx) = repo.begin_write().await?;

        let author_ids = self.resolve_persons(&mut tx, &entry.authors).await?;
        let editor_ids = self.resolve_persons(&mut tx, &entry.editors).await?;
        let publisher_id = match entry.publisher {
            Some(ref publisher) => Some(repo.natural_keys.resolve_publisher(&mut *tx, publisher).await?),
            None => None,
        };

        let (book_id, outcome) = match book.id {
            Some(id) => {
                if !repo.books.exists(&mut *tx, id).await? {
                    return Err(AppError::NotFound(format!("Book {} not found", id)));
                }
                (id, SaveOutcome::Updated)
            }
            None => {
                let resolved = repo.natural_keys.resolve_book(&mut *tx, &book).await?;
                if !resolved.created {
                    // Nothing of the submission is kept; dropping tx rolls back
                    // any persons or publisher created above.
                    let row = repo
                        .projection
                        .get_row(&mut *tx, resolved.id)
                        .await?
                        .ok_or_else(|| AppError::Internal(format!("Book {} has no list row", resolved.id)))?;
                    return Ok(SaveResponse {
                        outcome: SaveOutcome::Existing,
                        row,
                    });
                }
                (resolved.id, SaveOutcome::Created)
            }
        };

        repo.relations
            .synchronize(&mut *tx, book_id, ContributorRole::Author, &author_ids)
            .await?;
        repo.relations
            .synchronize(&mut *tx, book_id, ContributorRole::Editor, &editor_ids)
            .await?;
        repo.relations
            .synchronize_publication(&mut *tx, book_id, publisher_id)
            .await?;

        if outcome == SaveOutcome::Updated {
            repo.books.update_scalars(&mut *tx, book_id, &book).await?;
        }

        repo.natural_keys.purge_orphans(&mut *tx).await?;

        let row = repo
            .projection
            .refresh(&mut *tx, book_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Book {} vanished during save", book_id)))?;

        tx.commit().await?;

        tracing::info!(
            book_id,
            ?outcome,
            authors = author_ids.len(),
            editors = editor_ids.len(),
            "Saved catalog entry"
        );

        Ok(SaveResponse { outcome, row })
    }

    async fn resolve_persons(
        &self,
        tx: &mut sqlx::Transaction<'static, sqlx::Sqlite>,
        persons: &[Person],
    ) -> AppResult<Vec<i64>> {
        let mut ids = Vec::with_capacity(persons.len());
        for person in persons {
            ids.push(self.repository.natural_keys.resolve_person(&mut **tx, person).await?);
        }
        Ok(ids)
    }

    /// Get the nested entry of a book
    pub async fn get_entry(&self, id: i64) -> AppResult<Option<FullEntry>> {
        let mut conn = self.repository.pool.acquire().await?;
        self.repository.projection.load_entry(&mut *conn, id).await
    }

    /// Get the list row of a book
    pub async fn get_row(&self, id: i64) -> AppResult<Option<DenormalizedRow>> {
        let mut conn = self.repository.pool.acquire().await?;
        self.repository.projection.get_row(&mut *conn, id).await
    }

    /// Delete a book with its associations. Returns false if it did not exist.
    pub async fn delete_entry(&self, id: i64) -> AppResult<bool> {
        let (_writer, mut tx) = self.repository.begin_write().await?;

        let deleted = self.repository.books.delete(&mut *tx, id).await?;
        if deleted {
            self.repository.natural_keys.purge_orphans(&mut *tx).await?;
        }

        tx.commit().await?;
        if deleted {
            tracing::info!(id, "Deleted catalog entry");
        }
        Ok(deleted)
    }

    /// Fetch one page of the catalog
    pub async fn query_page(&self, request: &PageRequest) -> AppResult<Page> {
        let (rows, total_matching_rows) = self.repository.pages.query(request).await?;
        Ok(Page {
            rows,
            page_index: request.page_index,
            total_matching_rows,
        })
    }

    /// Page index holding `id` under `view`, `None` if missing or filtered out
    pub async fn locate(&self, id: i64, page_size: i64, view: &ViewState) -> AppResult<Option<i64>> {
        self.repository.locator.locate(id, page_size, view).await
    }

    /// Fetch the page that now contains `id`, falling back to the first page
    /// when the row is gone or no longer matches the filter.
    pub async fn reveal(&self, id: i64, request: &PageRequest) -> AppResult<RevealedPage> {
        let located = self.locate(id, request.page_size, &request.view).await?;
        let page = self
            .query_page(&request.at_page(located.unwrap_or(0)))
            .await?;
        Ok(RevealedPage {
            page,
            located: located.is_some(),
        })
    }

    /// Check that the database answers
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.repository.pool).await?;
        Ok(())
    }

    /// Regenerate every list row from the relational tables
    pub async fn rebuild_projection(&self) -> AppResult<usize> {
        let (_writer, mut tx) = self.repository.begin_write().await?;
        let count = self.repository.projection.rebuild_all(&mut *tx).await?;
        tx.commit().await?;
        Ok(count)
    }
}
