//! Data models for bookguide
//!
//! Defines the book record handed around by the catalog, the fixed shelf
//! categories and the shelf itself. The JSON shape of a book record follows
//! the volume format of public book APIs (`{"id": .., "volumeInfo": {..}}`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Title shown when a record carries none
pub const UNKNOWN_TITLE: &str = "Unknown title";

/// Author line shown when a record carries no authors
pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// A book as supplied by the catalog
///
/// The bookshelf only ever inspects `id`; the metadata is carried along
/// untouched so it can be shown again later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookRecord {
    /// Identifier, unique within a catalog
    pub id: String,
    /// Descriptive metadata
    #[serde(rename = "volumeInfo", default)]
    pub volume_info: BookMetadata,
}

/// Free-form book metadata
///
/// Well-known fields are typed; anything else is kept in `extra` so that
/// records round-trip through storage unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_links: Option<ImageLinks>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub industry_identifiers: Vec<IndustryIdentifier>,
    /// Fields this crate does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cover image references
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// An ISBN or similar identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

impl BookRecord {
    /// Create a record with the given id and no metadata
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            volume_info: BookMetadata::default(),
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.volume_info.title = Some(title.into());
        self
    }

    /// Set the authors
    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.volume_info.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Title for display, falling back to a placeholder
    pub fn title(&self) -> &str {
        self.volume_info.title.as_deref().unwrap_or(UNKNOWN_TITLE)
    }

    /// Comma-separated authors for display, falling back to a placeholder
    pub fn authors_display(&self) -> String {
        if self.volume_info.authors.is_empty() {
            UNKNOWN_AUTHOR.to_string()
        } else {
            self.volume_info.authors.join(", ")
        }
    }

    /// Thumbnail URL, if the catalog supplied one
    pub fn thumbnail(&self) -> Option<&str> {
        self.volume_info
            .image_links
            .as_ref()
            .and_then(|links| links.thumbnail.as_deref().or(links.small_thumbnail.as_deref()))
    }
}

/// One of the two fixed shelf partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShelfCategory {
    #[default]
    WantToRead,
    Read,
}

impl ShelfCategory {
    /// Every category, in display order
    pub const ALL: [ShelfCategory; 2] = [ShelfCategory::WantToRead, ShelfCategory::Read];

    /// Stable tag used in storage and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ShelfCategory::WantToRead => "want-to-read",
            ShelfCategory::Read => "read",
        }
    }

    /// Human-readable heading
    pub fn label(&self) -> &'static str {
        match self {
            ShelfCategory::WantToRead => "Want to read",
            ShelfCategory::Read => "Read",
        }
    }

    /// The other category
    pub fn other(&self) -> ShelfCategory {
        match self {
            ShelfCategory::WantToRead => ShelfCategory::Read,
            ShelfCategory::Read => ShelfCategory::WantToRead,
        }
    }
}

impl fmt::Display for ShelfCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no shelf category
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown shelf category '{0}'. Use 'want-to-read' or 'read'.")]
pub struct ParseCategoryError(String);

impl FromStr for ShelfCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "want-to-read" | "want_to_read" | "to-read" | "want" => Ok(ShelfCategory::WantToRead),
            "read" | "done" => Ok(ShelfCategory::Read),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

/// The user's reading lists
///
/// Within a category ids are unique. The same id may sit in both categories
/// when added to each independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Shelf {
    #[serde(rename = "want-to-read", default)]
    want_to_read: Vec<BookRecord>,
    #[serde(default)]
    read: Vec<BookRecord>,
}

impl Shelf {
    /// An empty shelf
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in a category, in insertion order
    pub fn books(&self, category: ShelfCategory) -> &[BookRecord] {
        match category {
            ShelfCategory::WantToRead => &self.want_to_read,
            ShelfCategory::Read => &self.read,
        }
    }

    pub(crate) fn books_mut(&mut self, category: ShelfCategory) -> &mut Vec<BookRecord> {
        match category {
            ShelfCategory::WantToRead => &mut self.want_to_read,
            ShelfCategory::Read => &mut self.read,
        }
    }

    /// Check whether a category holds a record with this id
    pub fn contains_in(&self, category: ShelfCategory, id: &str) -> bool {
        self.books(category).iter().any(|b| b.id == id)
    }

    /// Check whether either category holds a record with this id
    pub fn contains(&self, id: &str) -> bool {
        ShelfCategory::ALL
            .iter()
            .any(|&category| self.contains_in(category, id))
    }

    /// First category holding the id (want-to-read is checked first)
    pub fn category_of(&self, id: &str) -> Option<ShelfCategory> {
        ShelfCategory::ALL
            .into_iter()
            .find(|&category| self.contains_in(category, id))
    }

    /// Number of records in a category
    pub fn count(&self, category: ShelfCategory) -> usize {
        self.books(category).len()
    }

    /// Total number of entries across both categories
    pub fn len(&self) -> usize {
        self.want_to_read.len() + self.read.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_as_tag() {
        let json = serde_json::to_string(&ShelfCategory::WantToRead).unwrap();
        assert_eq!(json, "\"want-to-read\"");
        let json = serde_json::to_string(&ShelfCategory::Read).unwrap();
        assert_eq!(json, "\"read\"");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("want-to-read".parse::<ShelfCategory>(), Ok(ShelfCategory::WantToRead));
        assert_eq!("Want".parse::<ShelfCategory>(), Ok(ShelfCategory::WantToRead));
        assert_eq!(" read ".parse::<ShelfCategory>(), Ok(ShelfCategory::Read));
        assert!("favorites".parse::<ShelfCategory>().is_err());
    }

    #[test]
    fn test_default_category_is_want_to_read() {
        assert_eq!(ShelfCategory::default(), ShelfCategory::WantToRead);
        assert_eq!(ShelfCategory::Read.other(), ShelfCategory::WantToRead);
    }

    #[test]
    fn test_shelf_json_shape() {
        let mut shelf = Shelf::new();
        shelf
            .books_mut(ShelfCategory::Read)
            .push(BookRecord::new("1").with_title("Dune"));

        let value = serde_json::to_value(&shelf).unwrap();
        assert!(value["want-to-read"].as_array().unwrap().is_empty());
        assert_eq!(value["read"][0]["id"], "1");
        assert_eq!(value["read"][0]["volumeInfo"]["title"], "Dune");
    }

    #[test]
    fn test_missing_category_deserializes_empty() {
        let shelf: Shelf = serde_json::from_str(r#"{"read": [{"id": "7"}]}"#).unwrap();
        assert_eq!(shelf.count(ShelfCategory::WantToRead), 0);
        assert!(shelf.contains_in(ShelfCategory::Read, "7"));
        assert_eq!(shelf.books(ShelfCategory::Read)[0].title(), UNKNOWN_TITLE);
    }

    #[test]
    fn test_unknown_metadata_round_trips() {
        let json = r#"{
            "id": "abc",
            "volumeInfo": {
                "title": "Mastering JavaScript",
                "authors": ["Jane Smith"],
                "pageCount": 500,
                "publisher": "Example Press",
                "industryIdentifiers": [{"type": "ISBN_13", "identifier": "978-0987654321"}]
            }
        }"#;
        let record: BookRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.volume_info.page_count, Some(500));
        assert_eq!(record.volume_info.industry_identifiers[0].kind, "ISBN_13");
        assert_eq!(record.volume_info.extra["publisher"], "Example Press");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["volumeInfo"]["publisher"], "Example Press");
    }

    #[test]
    fn test_display_fallbacks() {
        let record = BookRecord::new("x");
        assert_eq!(record.title(), UNKNOWN_TITLE);
        assert_eq!(record.authors_display(), UNKNOWN_AUTHOR);
        assert!(record.thumbnail().is_none());

        let record = BookRecord::new("y").with_authors(["A", "B"]);
        assert_eq!(record.authors_display(), "A, B");
    }

    #[test]
    fn test_category_of_prefers_want_to_read() {
        let mut shelf = Shelf::new();
        shelf.books_mut(ShelfCategory::Read).push(BookRecord::new("1"));
        shelf.books_mut(ShelfCategory::WantToRead).push(BookRecord::new("1"));

        assert_eq!(shelf.category_of("1"), Some(ShelfCategory::WantToRead));
        assert_eq!(shelf.category_of("2"), None);
        assert_eq!(shelf.len(), 2);
    }
}
