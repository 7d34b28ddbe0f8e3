//! File-backed key-value persistence
//!
//! Each key is stored as its own file in the data directory. Writes are
//! atomic (write to temp file, then rename) so a crash never leaves a
//! half-written value behind.
//!
//! Storage location: `~/.local/share/bookguide/` (configurable via `Config`)
//!
//! Key `bookguide:shelf` maps to the file `bookguide_shelf.json`.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::error::{StorageError, StorageResult};
use super::KeyValueStorage;

/// Key-value storage with one JSON file per key
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the value files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        Ok(self.dir.join(file_name_for(key)?))
    }

    /// Check whether a value is stored under `key`
    pub fn exists(&self, key: &str) -> bool {
        self.path_for(key).map(|p| p.exists()).unwrap_or(false)
    }

    /// Total size in bytes of all value files
    pub fn total_size(&self) -> u64 {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|entry| entry.metadata().ok())
            .map(|meta| meta.len())
            .sum()
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_read(e, path)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        atomic_write(&path, value.as_bytes())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_write(e, path)),
        }
    }
}

/// Map a namespaced key to a file name
///
/// Namespace separators become underscores; anything outside
/// `[A-Za-z0-9._-]` is rejected so keys cannot escape the data directory.
fn file_name_for(key: &str) -> StorageResult<String> {
    let trimmed = key.trim_start_matches('@');
    if trimmed.is_empty() || trimmed.starts_with('.') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    let mut name = String::with_capacity(trimmed.len() + 5);
    for c in trimmed.chars() {
        match c {
            ':' | '/' => name.push('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => name.push(c),
            _ => return Err(StorageError::InvalidKey(key.to_string())),
        }
    }
    if name.contains("..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    name.push_str(".json");
    Ok(name)
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_write(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_write(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_write(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        // Initially nothing stored
        assert!(!storage.exists("bookguide:shelf"));
        assert!(storage.get_item("bookguide:shelf").unwrap().is_none());

        storage
            .set_item("bookguide:shelf", r#"{"want-to-read":[],"read":[]}"#)
            .unwrap();
        assert!(storage.exists("bookguide:shelf"));
        assert!(temp_dir.path().join("bookguide_shelf.json").exists());

        let loaded = storage.get_item("bookguide:shelf").unwrap().unwrap();
        assert_eq!(loaded, r#"{"want-to-read":[],"read":[]}"#);
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.set_item("bookguide:session", "first").unwrap();
        storage.set_item("bookguide:session", "second").unwrap();

        assert_eq!(
            storage.get_item("bookguide:session").unwrap().as_deref(),
            Some("second")
        );
        // No temp file left behind
        assert!(!temp_dir.path().join("bookguide_session.tmp").exists());
    }

    #[test]
    fn test_remove_item() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.set_item("bookguide:session", "{}").unwrap();
        storage.remove_item("bookguide:session").unwrap();
        assert!(storage.get_item("bookguide:session").unwrap().is_none());

        // Removing again is fine
        storage.remove_item("bookguide:session").unwrap();
    }

    #[test]
    fn test_file_name_mapping() {
        assert_eq!(file_name_for("bookguide:shelf").unwrap(), "bookguide_shelf.json");
        assert_eq!(
            file_name_for("@GuiaLivros:estante").unwrap(),
            "GuiaLivros_estante.json"
        );
        assert!(file_name_for("../escape").is_err());
        assert!(file_name_for("").is_err());
        assert!(file_name_for("with space").is_err());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir
            .path()
            .join("a")
            .join("b")
            .join("c")
            .join("file.json");

        atomic_write(&nested_path, b"test data").unwrap();

        assert!(nested_path.exists());
        let content = fs::read_to_string(&nested_path).unwrap();
        assert_eq!(content, "test data");
    }

    #[test]
    fn test_total_size_counts_value_files() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        assert_eq!(storage.total_size(), 0);

        storage.set_item("a", "12345").unwrap();
        storage.set_item("b", "123").unwrap();
        assert_eq!(storage.total_size(), 8);
    }

    #[test]
    fn test_missing_directory_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("not-yet-created"));

        assert!(storage.get_item("bookguide:shelf").unwrap().is_none());
        assert_eq!(storage.total_size(), 0);
    }
}
