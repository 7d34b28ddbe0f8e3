//! SQLite-backed key-value storage

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::error::{StorageError, StorageResult};
use super::schema::{init_schema, needs_init};
use super::KeyValueStorage;

/// Key-value storage in a single SQLite table
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        if needs_init(&conn) {
            init_schema(&conn)?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("sqlite connection lock poisoned".into()))
    }

    /// Number of stored slots
    pub fn len(&self) -> StorageResult<i64> {
        let count = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn()?
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn()?.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.conn()?.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert!(storage.is_empty().unwrap());

        storage.set_item("bookguide:shelf", "{}").unwrap();
        assert_eq!(
            storage.get_item("bookguide:shelf").unwrap().as_deref(),
            Some("{}")
        );

        storage.set_item("bookguide:shelf", "[]").unwrap();
        assert_eq!(
            storage.get_item("bookguide:shelf").unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(storage.len().unwrap(), 1);

        storage.remove_item("bookguide:shelf").unwrap();
        assert!(storage.get_item("bookguide:shelf").unwrap().is_none());
        storage.remove_item("bookguide:shelf").unwrap();
    }

    #[test]
    fn test_values_persist_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("bookguide.db");

        {
            let storage = SqliteStorage::open(&path).unwrap();
            storage.set_item("bookguide:session", r#"{"email":"a@b.c"}"#).unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(
            storage.get_item("bookguide:session").unwrap().as_deref(),
            Some(r#"{"email":"a@b.c"}"#)
        );
    }
}
