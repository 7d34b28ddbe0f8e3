//! bookguide Core Library
//!
//! This crate provides the core functionality for bookguide, a local-first
//! companion for discovering books and nearby libraries, keeping a personal
//! reading list and writing reviews.
//!
//! # Architecture
//!
//! - **Storage**: durable key-value slots (file, SQLite or in-memory backend)
//! - **Bookshelf**: two reading lists persisted as a single JSON blob
//!
//! Every store is constructed explicitly over a storage backend and handed to
//! its consumers; there is no process-wide state.
//!
//! # Quick Start
//!
//! ```text
//! let storage = Arc::new(FileStorage::new(config.data_dir.clone()));
//! let mut shelf = Bookshelf::new(storage.clone());
//!
//! shelf.add(book, ShelfCategory::WantToRead);
//! shelf.move_book(&book_id, ShelfCategory::WantToRead, ShelfCategory::Read);
//! assert!(shelf.contains(&book_id));
//! ```
//!
//! # Modules
//!
//! - `bookshelf`: the reading list store (main entry point)
//! - `models`: book records, shelf categories and the shelf itself
//! - `storage`: key-value persistence backends
//! - `reviews`: per-book reviews gated on authorship
//! - `session`: registered accounts and the signed-in identity
//! - `catalog`: book search over a local catalog
//! - `libraries`: nearby library lookup and route links
//! - `config`: application configuration

pub mod bookshelf;
pub mod catalog;
pub mod config;
pub mod libraries;
pub mod models;
pub mod reviews;
pub mod session;
pub mod storage;

pub use bookshelf::{AddOutcome, Bookshelf, MoveOutcome, RemoveOutcome, SharedBookshelf};
pub use catalog::{Catalog, CatalogError, LocalCatalog, SearchPage};
pub use config::{Config, StorageBackend};
pub use libraries::{
    route_url, Coordinates, Library, LibraryDirectory, LibraryError, NearbyLibrary, RoutePlatform,
};
pub use models::{BookMetadata, BookRecord, Shelf, ShelfCategory};
pub use reviews::{Rating, Review, ReviewDraft, ReviewError, ReviewStore};
pub use session::{Credentials, Identity, SessionError, SessionStore};
pub use storage::{
    open_backend, FileStorage, KeyValueStorage, MemoryStorage, SqliteStorage, StorageError,
};
