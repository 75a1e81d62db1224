//! Book-person association (N:M with role and display position)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Role a person holds on a book. A person may hold both roles independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContributorRole {
    Author,
    Editor,
}

impl ContributorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributorRole::Author => "author",
            ContributorRole::Editor => "editor",
        }
    }
}

impl std::fmt::Display for ContributorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Junction row linking a book to a person in one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contribution {
    pub book_id: i64,
    pub person_id: i64,
    pub role: String,
    pub position: i64,
}

/// What a relation synchronization changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub removed: usize,
    pub added: usize,
    pub moved: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.removed == 0 && self.added == 0 && self.moved == 0
    }
}
