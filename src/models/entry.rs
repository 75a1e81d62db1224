//! Full catalog entries: a book with its ordered contributors and publisher

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{
    book::Book,
    page::DenormalizedRow,
    person::{Person, Publisher},
};

/// Nested shape of one book as submitted for create/update
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct FullEntry {
    pub book: Book,
    #[serde(default)]
    pub authors: Vec<Person>,
    #[serde(default)]
    pub editors: Vec<Person>,
    #[serde(default)]
    pub publisher: Option<Publisher>,
}

/// Flat edit form as typed by an editor.
///
/// `authors`/`editors` are `Last, First; Last, First`, `publisher` is `Location: Name`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct EntryForm {
    pub title: Option<String>,
    #[validate(length(max = 17, message = "ISBN-10 is too long"))]
    pub isbn10: Option<String>,
    #[validate(length(max = 17, message = "ISBN-13 is too long"))]
    pub isbn13: Option<String>,
    #[validate(range(min = -9999, max = 9999, message = "Year out of range"))]
    pub year: Option<i32>,
    pub shelf_mark: Option<String>,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub editors: String,
    #[serde(default)]
    pub publisher: String,
}

impl EntryForm {
    /// Split the free-text fields into a nested entry for book `id`.
    pub fn into_entry(self, id: Option<i64>) -> FullEntry {
        FullEntry {
            book: Book {
                id,
                isbn10: self.isbn10,
                isbn13: self.isbn13,
                title: self.title,
                year: self.year,
                shelf_mark: self.shelf_mark,
                ..Default::default()
            },
            authors: Person::parse_list(&self.authors),
            editors: Person::parse_list(&self.editors),
            publisher: Publisher::parse(&self.publisher),
        }
    }
}

/// How a save was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Created,
    Updated,
    /// A book with the same ISBN pair already existed; the submission was discarded.
    Existing,
}

/// Result of a save: the refreshed list row for the book
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaveResponse {
    pub outcome: SaveOutcome,
    pub row: DenormalizedRow,
}
