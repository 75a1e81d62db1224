//! Data models for the catalog

pub mod book;
pub mod contribution;
pub mod entry;
pub mod page;
pub mod person;

// Re-export commonly used types
pub use book::Book;
pub use contribution::{ContributorRole, SyncReport};
pub use entry::{EntryForm, FullEntry, SaveOutcome, SaveResponse};
pub use page::{DenormalizedRow, Page, PageRequest, SortDirection, SortKey, ViewState};
pub use person::{Person, Publisher};

/// Trim free text; blank becomes `None`.
pub(crate) fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
