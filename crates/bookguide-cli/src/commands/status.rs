//! Status command handler

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use bookguide_core::{
    Config, FileStorage, ReviewStore, SessionStore, SharedBookshelf, ShelfCategory, StorageBackend,
};

use super::Backend;
use crate::output::{Output, OutputFormat};

#[derive(Debug, Serialize)]
struct StatusReport {
    storage: StorageBackend,
    data_dir: PathBuf,
    data_size: u64,
    signed_in: Option<String>,
    shelf: ShelfCounts,
    reviews: usize,
}

#[derive(Debug, Serialize)]
struct ShelfCounts {
    want_to_read: usize,
    read: usize,
}

/// Bytes used on disk by the selected backend
fn data_size(config: &Config) -> u64 {
    match config.storage {
        StorageBackend::File => FileStorage::new(config.data_dir.clone()).total_size(),
        StorageBackend::Sqlite => std::fs::metadata(config.sqlite_path())
            .map(|m| m.len())
            .unwrap_or(0),
        StorageBackend::Memory => 0,
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Show status information
pub async fn show(
    config: &Config,
    shelf: &SharedBookshelf<Backend>,
    reviews: &ReviewStore<Backend>,
    session: &SessionStore<Backend>,
    output: &Output,
) -> Result<()> {
    let snapshot = shelf.load().await;
    let report = StatusReport {
        storage: config.storage,
        data_dir: config.data_dir.clone(),
        data_size: data_size(config),
        signed_in: session.current().map(|i| i.email),
        shelf: ShelfCounts {
            want_to_read: snapshot.count(ShelfCategory::WantToRead),
            read: snapshot.count(ShelfCategory::Read),
        },
        reviews: reviews.all().map(|r| r.len()).unwrap_or(0),
    };

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Quiet => {
            println!("{}", report.data_dir.display());
        }
        OutputFormat::Human => {
            println!("bookguide Status");
            println!("================");
            println!();
            println!("Account:");
            println!(
                "  {}",
                report.signed_in.as_deref().unwrap_or("not signed in")
            );
            println!();
            println!("Storage:");
            println!("  Backend:  {}", report.storage);
            println!("  Location: {}", report.data_dir.display());
            println!("  Size:     {}", human_size(report.data_size));
            println!();
            println!("Shelf:");
            println!(
                "  {}: {}",
                ShelfCategory::WantToRead.label(),
                report.shelf.want_to_read
            );
            println!("  {}: {}", ShelfCategory::Read.label(), report.shelf.read);
            println!();
            println!("Reviews: {}", report.reviews);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_data_size_per_backend() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        assert_eq!(data_size(&config), 0);

        std::fs::write(temp_dir.path().join("bookguide_shelf.json"), "{}").unwrap();
        assert_eq!(data_size(&config), 2);

        config.storage = StorageBackend::Memory;
        assert_eq!(data_size(&config), 0);
    }
}
