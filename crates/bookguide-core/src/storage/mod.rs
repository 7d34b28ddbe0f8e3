//! Storage layer
//!
//! Every store in bookguide persists its state as a single string value under
//! a fixed, namespaced key. This module defines that key-value contract and
//! its backends.
//!
//! ## Backends
//!
//! - **File**: one JSON file per key in the data directory (default)
//! - **SQLite**: a single `kv` table in `bookguide.db`
//! - **Memory**: process-local, for tests and throwaway sessions

pub mod error;
pub mod memory;
pub mod persistence;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;

use crate::config::{Config, StorageBackend};

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use persistence::FileStorage;
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::SqliteStorage;

/// A durable string-valued key-value store
///
/// Implementations take `&self` for writes so one backend can be shared
/// behind an `Arc` by several stores.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value stored under `key`
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete the value stored under `key` (absent keys are not an error)
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Arc<S> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Box<S> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}

/// Open the backend selected in the configuration
pub fn open_backend(config: &Config) -> StorageResult<Arc<dyn KeyValueStorage>> {
    let backend: Arc<dyn KeyValueStorage> = match config.storage {
        StorageBackend::File => Arc::new(FileStorage::new(config.data_dir.clone())),
        StorageBackend::Sqlite => Arc::new(SqliteStorage::open(&config.sqlite_path())?),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    };
    tracing::debug!(backend = ?config.storage, "opened storage backend");
    Ok(backend)
}
