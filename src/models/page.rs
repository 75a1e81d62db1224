//! Paginated catalog view types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One book flattened for list display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DenormalizedRow {
    pub id: i64,
    pub title: Option<String>,
    /// Authors in display order, `; `-separated
    pub authors: String,
    pub editors: String,
    pub publisher: String,
    pub year: Option<i32>,
    pub shelf_mark: Option<String>,
}

/// Sortable catalog columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Id,
    Title,
    Authors,
    Editors,
    Publisher,
    Year,
    ShelfMark,
}

impl SortKey {
    /// Id and year compare numerically, everything else as case-folded text.
    pub fn is_numeric(&self) -> bool {
        matches!(self, SortKey::Id | SortKey::Year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort and filter state shared by page queries and the page locator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub filter: Option<String>,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub case_insensitive: bool,
}

impl ViewState {
    /// The filter text when it should restrict rows; blank means match all.
    pub fn effective_filter(&self) -> Option<&str> {
        self.filter.as_deref().filter(|f| !f.trim().is_empty())
    }
}

/// A request for one page of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_index: i64,
    pub page_size: i64,
    #[serde(flatten)]
    pub view: ViewState,
}

impl PageRequest {
    pub fn new(page_index: i64, page_size: i64) -> Self {
        Self {
            page_index,
            page_size,
            view: ViewState {
                case_insensitive: true,
                ..Default::default()
            },
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.view.filter = Some(filter.into());
        self
    }

    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.view.sort_key = key;
        self.view.sort_direction = direction;
        self
    }

    pub fn at_page(&self, page_index: i64) -> Self {
        Self {
            page_index,
            ..self.clone()
        }
    }

    /// Rows skipped before this page; `None` when the page lies beyond any
    /// addressable row.
    pub fn offset(&self) -> Option<i64> {
        self.page_index.checked_mul(self.page_size)
    }
}

/// One page of catalog rows
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Page {
    pub rows: Vec<DenormalizedRow>,
    pub page_index: i64,
    /// Rows matching the filter across all pages
    pub total_matching_rows: i64,
}

impl Page {
    /// Highest valid page index for `total` rows; 0 for an empty view.
    pub fn last_index(total: i64, page_size: i64) -> i64 {
        if total <= 0 || page_size <= 0 {
            return 0;
        }
        (total + page_size - 1) / page_size - 1
    }

    pub fn contains(&self, id: i64) -> bool {
        self.rows.iter().any(|r| r.id == id)
    }
}
