//! Bookshelf store
//!
//! The `Bookshelf` owns the user's two reading lists and keeps them in a
//! single storage slot (`bookguide:shelf`). Every mutation rewrites the whole
//! shelf.
//!
//! ## Failure handling
//!
//! No operation returns an error. A slot that cannot be read or parsed is
//! treated as an empty shelf; a failed write is logged and dropped while the
//! in-memory shelf keeps the change. Not-found and duplicate conditions are
//! reported through the outcome enums, which convert to the plain boolean
//! contract with `succeeded()` or `bool::from`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut shelf = Bookshelf::new(storage);
//!
//! shelf.add(book, ShelfCategory::WantToRead);
//! shelf.move_book("1", ShelfCategory::WantToRead, ShelfCategory::Read);
//! assert!(shelf.contains("1"));
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::models::{BookRecord, Shelf, ShelfCategory};
use crate::storage::KeyValueStorage;

/// Storage slot holding the serialized shelf
pub const SHELF_KEY: &str = "bookguide:shelf";

/// Result of [`Bookshelf::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Appended to the category
    Added,
    /// The category already held that id; nothing changed
    Duplicate,
}

impl AddOutcome {
    pub fn succeeded(self) -> bool {
        matches!(self, AddOutcome::Added)
    }
}

/// Result of [`Bookshelf::remove`]
///
/// Both variants count as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The category did not hold the id
    Absent,
}

impl RemoveOutcome {
    pub fn succeeded(self) -> bool {
        true
    }
}

/// Result of [`Bookshelf::move_book`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Removed from the source and appended to the destination
    Moved,
    /// Removed from the source; the destination already held the id and was left alone
    AlreadyInDestination,
    /// The source did not hold the id; nothing changed
    NotFound,
}

impl MoveOutcome {
    pub fn succeeded(self) -> bool {
        !matches!(self, MoveOutcome::NotFound)
    }
}

impl From<AddOutcome> for bool {
    fn from(outcome: AddOutcome) -> bool {
        outcome.succeeded()
    }
}

impl From<RemoveOutcome> for bool {
    fn from(outcome: RemoveOutcome) -> bool {
        outcome.succeeded()
    }
}

impl From<MoveOutcome> for bool {
    fn from(outcome: MoveOutcome) -> bool {
        outcome.succeeded()
    }
}

/// The reading list store
///
/// Loads the shelf lazily on first use and caches it for the lifetime of the
/// instance. Construct one per application and pass it to whoever needs it.
pub struct Bookshelf<S> {
    storage: S,
    shelf: Option<Shelf>,
}

impl<S: KeyValueStorage> Bookshelf<S> {
    /// Create a store over `storage`; nothing is read until first use
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            shelf: None,
        }
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Current shelf, read from storage on first call
    pub fn load(&mut self) -> &Shelf {
        self.shelf_mut()
    }

    fn shelf_mut(&mut self) -> &mut Shelf {
        if self.shelf.is_none() {
            self.shelf = Some(read_shelf(&self.storage));
        }
        self.shelf.get_or_insert_with(Shelf::new)
    }

    /// Add a record to a category unless the category already holds its id
    ///
    /// The other category is not consulted.
    pub fn add(&mut self, record: BookRecord, category: ShelfCategory) -> AddOutcome {
        let shelf = self.shelf_mut();
        if shelf.contains_in(category, &record.id) {
            debug!(id = %record.id, %category, "book already on shelf");
            return AddOutcome::Duplicate;
        }

        debug!(id = %record.id, %category, "adding book to shelf");
        shelf.books_mut(category).push(record);
        self.persist();
        AddOutcome::Added
    }

    /// Add a record to the want-to-read list
    pub fn add_to_read_later(&mut self, record: BookRecord) -> AddOutcome {
        self.add(record, ShelfCategory::default())
    }

    /// Remove every record with `id` from a category
    ///
    /// Always persists and always succeeds.
    pub fn remove(&mut self, id: &str, category: ShelfCategory) -> RemoveOutcome {
        let books = self.shelf_mut().books_mut(category);
        let before = books.len();
        books.retain(|b| b.id != id);
        let removed = before - books.len();

        debug!(%id, %category, removed, "removing book from shelf");
        self.persist();

        if removed > 0 {
            RemoveOutcome::Removed
        } else {
            RemoveOutcome::Absent
        }
    }

    /// Move a record between categories
    ///
    /// The record is always taken out of `from` when present there. It is
    /// appended to `to` only if `to` does not already hold the id.
    pub fn move_book(&mut self, id: &str, from: ShelfCategory, to: ShelfCategory) -> MoveOutcome {
        let shelf = self.shelf_mut();
        let Some(record) = shelf.books(from).iter().find(|b| b.id == id).cloned() else {
            debug!(%id, %from, "book to move not found");
            return MoveOutcome::NotFound;
        };

        shelf.books_mut(from).retain(|b| b.id != id);

        let outcome = if shelf.contains_in(to, id) {
            MoveOutcome::AlreadyInDestination
        } else {
            shelf.books_mut(to).push(record);
            MoveOutcome::Moved
        };

        debug!(%id, %from, %to, ?outcome, "moving book");
        self.persist();
        outcome
    }

    /// Check whether either category holds `id`
    pub fn contains(&mut self, id: &str) -> bool {
        self.load().contains(id)
    }

    /// Records in a category, in insertion order
    pub fn list(&mut self, category: ShelfCategory) -> &[BookRecord] {
        self.load().books(category)
    }

    /// First category holding `id`
    pub fn category_of(&mut self, id: &str) -> Option<ShelfCategory> {
        self.load().category_of(id)
    }

    /// Record with `id` from whichever category holds it first
    pub fn find(&mut self, id: &str) -> Option<&BookRecord> {
        let shelf = self.load();
        ShelfCategory::ALL
            .into_iter()
            .find_map(move |category| shelf.books(category).iter().find(|b| b.id == id))
    }

    /// Number of records per category, in `ShelfCategory::ALL` order
    pub fn counts(&mut self) -> [(ShelfCategory, usize); 2] {
        let shelf = self.load();
        ShelfCategory::ALL.map(|category| (category, shelf.count(category)))
    }

    /// Drop the cached shelf so the next call re-reads storage
    pub fn reload(&mut self) -> &Shelf {
        self.shelf = None;
        self.load()
    }

    /// Write the whole shelf back to its slot
    ///
    /// Failures are logged and swallowed.
    fn persist(&self) {
        let Some(shelf) = self.shelf.as_ref() else {
            return;
        };

        let json = match serde_json::to_string(shelf) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialize shelf");
                return;
            }
        };

        if let Err(e) = self.storage.set_item(SHELF_KEY, &json) {
            error!(error = %e, key = SHELF_KEY, "failed to save shelf; change kept in memory only");
        }
    }
}

/// Read the shelf from storage, degrading to an empty shelf
fn read_shelf<S: KeyValueStorage>(storage: &S) -> Shelf {
    match storage.get_item(SHELF_KEY) {
        Ok(Some(json)) => match serde_json::from_str(&json) {
            Ok(shelf) => {
                debug!(key = SHELF_KEY, "loaded shelf");
                shelf
            }
            Err(e) => {
                warn!(error = %e, key = SHELF_KEY, "stored shelf is unreadable; starting empty");
                Shelf::new()
            }
        },
        Ok(None) => {
            debug!(key = SHELF_KEY, "no stored shelf; starting empty");
            Shelf::new()
        }
        Err(e) => {
            warn!(error = %e, key = SHELF_KEY, "failed to load shelf; starting empty");
            Shelf::new()
        }
    }
}

/// Cloneable handle for sharing one bookshelf between tasks
///
/// Each operation holds the lock for its whole read-modify-write, so
/// concurrent callers are applied one after another and none of their
/// changes is lost.
pub struct SharedBookshelf<S> {
    inner: Arc<Mutex<Bookshelf<S>>>,
}

impl<S> Clone for SharedBookshelf<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStorage> SharedBookshelf<S> {
    pub fn new(bookshelf: Bookshelf<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bookshelf)),
        }
    }

    /// Snapshot of the current shelf
    pub async fn load(&self) -> Shelf {
        self.inner.lock().await.load().clone()
    }

    pub async fn add(&self, record: BookRecord, category: ShelfCategory) -> AddOutcome {
        self.inner.lock().await.add(record, category)
    }

    pub async fn remove(&self, id: &str, category: ShelfCategory) -> RemoveOutcome {
        self.inner.lock().await.remove(id, category)
    }

    pub async fn move_book(&self, id: &str, from: ShelfCategory, to: ShelfCategory) -> MoveOutcome {
        self.inner.lock().await.move_book(id, from, to)
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.inner.lock().await.contains(id)
    }
}
