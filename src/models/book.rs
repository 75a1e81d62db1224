//! Book model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::clean;

/// Catalog book. A freshly created placeholder has every scalar field unset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    #[serde(default)]
    pub id: Option<i64>,
    pub isbn10: Option<String>,
    pub isbn13: Option<String>,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub shelf_mark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Keep only ISBN digits and the `X` check character.
fn sanitize_isbn(s: &str) -> Option<String> {
    let isbn: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'x' || *c == 'X')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    (!isbn.is_empty()).then_some(isbn)
}

impl Book {
    /// Trimmed copy with blank fields unset and ISBNs stripped of separators
    pub fn normalized(&self) -> Self {
        Self {
            isbn10: self.isbn10.as_deref().and_then(sanitize_isbn),
            isbn13: self.isbn13.as_deref().and_then(sanitize_isbn),
            title: clean(self.title.as_deref()),
            shelf_mark: clean(self.shelf_mark.as_deref()),
            ..self.clone()
        }
    }

    /// Books without any ISBN never match an existing row.
    pub fn has_natural_key(&self) -> bool {
        self.isbn10.is_some() || self.isbn13.is_some()
    }
}
