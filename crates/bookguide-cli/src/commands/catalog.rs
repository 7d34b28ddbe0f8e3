//! Catalog command handlers

use anyhow::{anyhow, Context, Result};

use bookguide_core::{
    BookRecord, Catalog, Config, LocalCatalog, ReviewStore, SharedBookshelf, Shelf, ShelfCategory,
};

use super::Backend;
use crate::output::{Output, OutputFormat};

/// Load the configured catalog file
pub fn open(config: &Config) -> Result<LocalCatalog> {
    let path = config.catalog_file.as_ref().ok_or_else(|| {
        anyhow!(
            "No catalog configured.\n\
             Set one with: bookguide config set catalog_file <path>"
        )
    })?;
    LocalCatalog::load(path).context("Failed to load catalog")
}

/// Search by title or author
///
/// `page` is one-based on the command line.
pub fn search(catalog: &impl Catalog, query: String, page: usize, output: &Output) -> Result<()> {
    let result = catalog.search(&query, page.saturating_sub(1));

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "query": query,
                    "page": page,
                    "has_more": result.has_more,
                    "books": result.books
                }))?
            );
        }
        _ => {
            output.print_books(&result.books);
            if result.has_more && !output.is_quiet() {
                println!(
                    "More results: bookguide catalog search '{}' --page {}",
                    query,
                    page + 1
                );
            }
        }
    }

    Ok(())
}

/// Show one book with its shelf status and rating
///
/// Shelved books can be shown without a catalog.
pub async fn show(
    config: &Config,
    shelf: &SharedBookshelf<Backend>,
    reviews: &ReviewStore<Backend>,
    id: String,
    output: &Output,
) -> Result<()> {
    let snapshot = shelf.load().await;

    let from_catalog = match config.catalog_file {
        Some(_) => open(config)?.get(&id),
        None => None,
    };
    let book = from_catalog
        .or_else(|| shelved_copy(&snapshot, &id))
        .ok_or_else(|| anyhow!("Book not found: {}", id))?;

    output.print_book(&book, snapshot.category_of(&id));

    if output.format == OutputFormat::Human {
        let count = reviews.for_book(&id)?.len();
        match reviews.average_rating(&id)? {
            Some(avg) => println!("\nReviews:     {} (average {:.1}/5)", count, avg),
            None => println!("\nReviews:     none yet"),
        }
    }

    Ok(())
}

fn shelved_copy(shelf: &Shelf, id: &str) -> Option<BookRecord> {
    ShelfCategory::ALL
        .into_iter()
        .find_map(|category| shelf.books(category).iter().find(|b| b.id == id).cloned())
}
