//! Catalog search
//!
//! Books come from a catalog collaborator. `LocalCatalog` serves a JSON
//! array of book records from disk; matching is a case-insensitive substring
//! test on the title and on each author.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::BookRecord;

/// Records per search page
pub const PAGE_SIZE: usize = 10;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog '{path}' is not a JSON array of books: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog lists book id '{0}' more than once")]
    DuplicateId(String),
}

/// One page of search results
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub books: Vec<BookRecord>,
    /// Zero-based page number
    pub page: usize,
    /// Whether asking for the next page may return more
    pub has_more: bool,
}

/// A source of book records
pub trait Catalog {
    /// Search by title or author; an empty query lists everything
    fn search(&self, query: &str, page: usize) -> SearchPage;

    /// Record by id
    fn get(&self, id: &str) -> Option<BookRecord>;
}

/// Catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct LocalCatalog {
    books: Vec<BookRecord>,
}

impl LocalCatalog {
    /// Build a catalog, rejecting repeated ids
    pub fn new(books: Vec<BookRecord>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for book in &books {
            if !seen.insert(book.id.as_str()) {
                return Err(CatalogError::DuplicateId(book.id.clone()));
            }
        }
        Ok(Self { books })
    }

    /// Load a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let books = serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(books)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

fn matches_query(book: &BookRecord, needle: &str) -> bool {
    let info = &book.volume_info;
    info.title
        .as_deref()
        .is_some_and(|t| t.to_lowercase().contains(needle))
        || info.authors.iter().any(|a| a.to_lowercase().contains(needle))
}

impl Catalog for LocalCatalog {
    fn search(&self, query: &str, page: usize) -> SearchPage {
        let needle = query.trim().to_lowercase();
        let books: Vec<BookRecord> = self
            .books
            .iter()
            .filter(|b| needle.is_empty() || matches_query(b, &needle))
            .skip(page.saturating_mul(PAGE_SIZE))
            .take(PAGE_SIZE)
            .cloned()
            .collect();

        SearchPage {
            has_more: books.len() == PAGE_SIZE,
            books,
            page,
        }
    }

    fn get(&self, id: &str) -> Option<BookRecord> {
        self.books.iter().find(|b| b.id == id).cloned()
    }
}
