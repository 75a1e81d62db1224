//! Paginated, sorted and filtered reads over `catalog_rows`, and the page
//! locator that finds which page holds a given row.
//!
//! Both share one ordering: the sort column in the requested direction, ties
//! broken by book id ascending. Text columns are compared through their
//! case-folded `*_key` copies; id and year compare as integers.

use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::{DenormalizedRow, PageRequest, SortDirection, SortKey, ViewState},
};

fn sort_column(key: SortKey) -> &'static str {
    match key {
        SortKey::Id => "book_id",
        SortKey::Title => "title_key",
        SortKey::Authors => "authors_key",
        SortKey::Editors => "editors_key",
        SortKey::Publisher => "publisher_key",
        SortKey::Year => "year_key",
        SortKey::ShelfMark => "shelf_mark_key",
    }
}

fn sort_order(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}

/// WHERE fragment for the view's filter on table alias `alias`, plus the
/// needle to bind when there is one.
fn filter_clause(view: &ViewState, alias: &str) -> (String, Option<String>) {
    match view.effective_filter() {
        Some(filter) if view.case_insensitive => (
            format!("instr({}.search_key, ?) > 0", alias),
            Some(filter.to_lowercase()),
        ),
        Some(filter) => (
            format!("instr({}.search_text, ?) > 0", alias),
            Some(filter.to_string()),
        ),
        None => ("1=1".to_string(), None),
    }
}

fn check_page_size(page_size: i64) -> AppResult<()> {
    if page_size < 1 {
        return Err(AppError::Validation(format!(
            "Page size must be at least 1, got {}",
            page_size
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PageQueryEngine {
    pool: Pool<Sqlite>,
}

impl PageQueryEngine {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Rows of page `request.page_index` and the number of rows matching the
    /// filter. The page index is not clamped; past the end the page is empty.
    pub async fn query(&self, request: &PageRequest) -> AppResult<(Vec<DenormalizedRow>, i64)> {
        check_page_size(request.page_size)?;
        if request.page_index < 0 {
            return Err(AppError::Validation(format!(
                "Page index must not be negative, got {}",
                request.page_index
            )));
        }

        let view = &request.view;
        let (where_clause, needle) = filter_clause(view, "r");

        let count_query = format!("SELECT COUNT(*) FROM catalog_rows r WHERE {}", where_clause);
        let select_query = format!(
            r#"
            SELECT r.book_id AS id, r.title, r.authors, r.editors, r.publisher, r.year, r.shelf_mark
            FROM catalog_rows r
            WHERE {}
            ORDER BY r.{} {}, r.book_id ASC
            LIMIT ? OFFSET ?
            "#,
            where_clause,
            sort_column(view.sort_key),
            sort_order(view.sort_direction),
        );

        // Count and page come from the same snapshot.
        let mut tx = self.pool.begin().await?;

        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(ref needle) = needle {
            count = count.bind(needle.as_str());
        }
        let total = count.fetch_one(&mut *tx).await?;

        let rows = match request.offset() {
            Some(offset) => {
                let mut select = sqlx::query_as::<_, DenormalizedRow>(&select_query);
                if let Some(ref needle) = needle {
                    select = select.bind(needle.as_str());
                }
                select
                    .bind(request.page_size)
                    .bind(offset)
                    .fetch_all(&mut *tx)
                    .await?
            }
            // Past the end of any possible view.
            None => Vec::new(),
        };

        tx.commit().await?;

        tracing::debug!(
            page_index = request.page_index,
            page_size = request.page_size,
            sort_key = ?view.sort_key,
            filter = ?view.effective_filter(),
            total,
            returned = rows.len(),
            "Catalog page query"
        );

        Ok((rows, total))
    }
}

#[derive(Clone)]
pub struct PageLocator {
    pool: Pool<Sqlite>,
}

impl PageLocator {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Zero-based rank of `row_id` among the rows matching the view, or
    /// `None` when the row is missing or filtered out.
    pub async fn rank(&self, row_id: i64, view: &ViewState) -> AppResult<Option<i64>> {
        let (target_filter, needle) = filter_clause(view, "t");
        let (row_filter, _) = filter_clause(view, "r");

        let mut tx = self.pool.begin().await?;

        let exists_query = format!(
            "SELECT EXISTS(SELECT 1 FROM catalog_rows t WHERE t.book_id = ? AND {})",
            target_filter
        );
        let mut exists = sqlx::query_scalar::<_, i64>(&exists_query).bind(row_id);
        if let Some(ref needle) = needle {
            exists = exists.bind(needle.as_str());
        }
        if exists.fetch_one(&mut *tx).await? == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let column = sort_column(view.sort_key);
        let precedes = match view.sort_direction {
            SortDirection::Asc => "<",
            SortDirection::Desc => ">",
        };
        let rank_query = format!(
            r#"
            SELECT COUNT(*)
            FROM catalog_rows r, catalog_rows t
            WHERE t.book_id = ?
              AND {filter}
              AND (r.{col} {op} t.{col} OR (r.{col} = t.{col} AND r.book_id < t.book_id))
            "#,
            filter = row_filter,
            col = column,
            op = precedes,
        );
        let mut rank = sqlx::query_scalar::<_, i64>(&rank_query).bind(row_id);
        if let Some(ref needle) = needle {
            rank = rank.bind(needle.as_str());
        }
        let rank = rank.fetch_one(&mut *tx).await?;

        tx.commit().await?;
        Ok(Some(rank))
    }

    /// Page index holding `row_id` under the view's sort and filter.
    pub async fn locate(&self, row_id: i64, page_size: i64, view: &ViewState) -> AppResult<Option<i64>> {
        check_page_size(page_size)?;

        let page_index = self.rank(row_id, view).await?.map(|rank| rank / page_size);
        tracing::debug!(row_id, page_size, ?page_index, "Located catalog row");
        Ok(page_index)
    }
}
