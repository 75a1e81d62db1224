//! Person and publisher models: shared entities identified by natural keys

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::clean;

/// Separator between persons in a collapsed author/editor list
pub const PERSON_SEPARATOR: &str = "; ";

/// A person who can author or edit books.
///
/// Identity is the `(last_name, first_names)` pair; at least one half must be set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Person {
    #[serde(default)]
    pub id: Option<i64>,
    pub last_name: Option<String>,
    pub first_names: Option<String>,
}

impl Person {
    pub fn new(last_name: Option<&str>, first_names: Option<&str>) -> Self {
        Self {
            id: None,
            last_name: clean(last_name),
            first_names: clean(first_names),
        }
    }

    /// Trimmed copy with blank fields unset
    pub fn normalized(&self) -> Self {
        Self {
            id: self.id,
            last_name: clean(self.last_name.as_deref()),
            first_names: clean(self.first_names.as_deref()),
        }
    }

    pub fn has_natural_key(&self) -> bool {
        self.last_name.is_some() || self.first_names.is_some()
    }

    /// `Last, First`; a bare first name keeps its leading comma so it parses back.
    pub fn display(&self) -> Option<String> {
        match (self.last_name.as_deref(), self.first_names.as_deref()) {
            (Some(last), Some(first)) => Some(format!("{}, {}", last, first)),
            (Some(last), None) => Some(last.to_string()),
            (None, Some(first)) => Some(format!(", {}", first)),
            (None, None) => None,
        }
    }

    /// Parse a single `Last, First` entry. Text without a comma is a last name.
    pub fn parse(text: &str) -> Option<Self> {
        let person = match text.split_once(',') {
            Some((last, first)) => Person::new(Some(last), Some(first)),
            None => Person::new(Some(text), None),
        };
        person.has_natural_key().then_some(person)
    }

    /// Parse a `;`-separated list, keeping input order and skipping blanks.
    pub fn parse_list(text: &str) -> Vec<Self> {
        text.split(';').filter_map(Person::parse).collect()
    }

    /// Collapse persons into one order-preserving display string
    pub fn join(persons: &[Person]) -> String {
        persons
            .iter()
            .filter_map(Person::display)
            .collect::<Vec<_>>()
            .join(PERSON_SEPARATOR)
    }
}

/// A publisher, identified by `(name, location)`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Publisher {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub location: Option<String>,
}

impl Publisher {
    pub fn new(name: Option<&str>, location: Option<&str>) -> Self {
        Self {
            id: None,
            name: clean(name),
            location: clean(location),
        }
    }

    pub fn normalized(&self) -> Self {
        Self {
            id: self.id,
            name: clean(self.name.as_deref()),
            location: clean(self.location.as_deref()),
        }
    }

    pub fn has_natural_key(&self) -> bool {
        self.name.is_some() || self.location.is_some()
    }

    /// `Location: Name`; a bare location keeps its trailing colon so it parses back.
    pub fn display(&self) -> Option<String> {
        match (self.location.as_deref(), self.name.as_deref()) {
            (Some(location), Some(name)) => Some(format!("{}: {}", location, name)),
            (Some(location), None) => Some(format!("{}:", location)),
            (None, Some(name)) => Some(name.to_string()),
            (None, None) => None,
        }
    }

    /// Parse `Location: Name`. Text without a colon is a bare name.
    pub fn parse(text: &str) -> Option<Self> {
        let publisher = match text.split_once(':') {
            Some((location, name)) => Publisher::new(Some(name), Some(location)),
            None => Publisher::new(Some(text), None),
        };
        publisher.has_natural_key().then_some(publisher)
    }
}
