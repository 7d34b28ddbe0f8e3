//! Shelf command handlers

use anyhow::{anyhow, bail, Result};

use bookguide_core::{
    AddOutcome, BookRecord, Catalog, Config, MoveOutcome, SharedBookshelf, Shelf, ShelfCategory,
};

use super::{catalog, Backend};
use crate::editor::confirm;
use crate::output::{Output, OutputFormat};

/// List one category, or the whole shelf
pub async fn list(
    shelf: &SharedBookshelf<Backend>,
    category: Option<ShelfCategory>,
    output: &Output,
) -> Result<()> {
    let snapshot = shelf.load().await;

    if let Some(category) = category {
        output.print_books(snapshot.books(category));
        return Ok(());
    }

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        OutputFormat::Quiet => {
            for category in ShelfCategory::ALL {
                for book in snapshot.books(category) {
                    println!("{}", book.id);
                }
            }
        }
        OutputFormat::Human => {
            for (i, category) in ShelfCategory::ALL.into_iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("── {} ({}) ──", category.label(), snapshot.count(category));
                output.print_books(snapshot.books(category));
            }
        }
    }

    Ok(())
}

/// Shelve a book from the catalog, or described on the command line
pub async fn add(
    shelf: &SharedBookshelf<Backend>,
    config: &Config,
    id: String,
    category: ShelfCategory,
    title: Option<String>,
    authors: Vec<String>,
    output: &Output,
) -> Result<()> {
    let record = resolve_record(config, &id, title, authors)?;
    let title = record.title().to_string();

    match shelf.add(record, category).await {
        AddOutcome::Added => output.success(&format!("Added '{}' to {}", title, category.label())),
        AddOutcome::Duplicate => {
            output.unchanged(&format!("'{}' is already in {}", title, category.label()))
        }
    }

    Ok(())
}

fn resolve_record(
    config: &Config,
    id: &str,
    title: Option<String>,
    authors: Vec<String>,
) -> Result<BookRecord> {
    if let Some(title) = title {
        return Ok(BookRecord::new(id).with_title(title).with_authors(authors));
    }

    let catalog = catalog::open(config)?;
    catalog.get(id).ok_or_else(|| {
        anyhow!(
            "Book '{}' not found in the catalog.\n\
             Pass --title to shelve it anyway.",
            id
        )
    })
}

/// Categories to take `id` out of: the given one, or every one holding it
fn categories_holding(
    shelf: &Shelf,
    id: &str,
    category: Option<ShelfCategory>,
) -> Vec<ShelfCategory> {
    ShelfCategory::ALL
        .into_iter()
        .filter(|c| category.map_or(true, |wanted| wanted == *c))
        .filter(|c| shelf.contains_in(*c, id))
        .collect()
}

/// Take a book off the shelf
///
/// Without a category the book is removed from every category holding it.
pub async fn remove(
    shelf: &SharedBookshelf<Backend>,
    id: String,
    category: Option<ShelfCategory>,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let targets = categories_holding(&shelf.load().await, &id, category);
    if targets.is_empty() {
        match category {
            Some(category) => {
                output.unchanged(&format!("'{}' is not in {}", id, category.label()))
            }
            None => output.unchanged(&format!("'{}' is not on your shelf", id)),
        }
        return Ok(());
    }

    let labels = targets
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(" and ");

    if output.should_prompt() && !yes {
        println!("Remove '{}' from {}", id, labels);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    for category in &targets {
        shelf.remove(&id, *category).await;
    }
    output.success(&format!("Removed '{}' from {}", id, labels));

    Ok(())
}

/// Move a book between categories
pub async fn move_book(
    shelf: &SharedBookshelf<Backend>,
    id: String,
    to: ShelfCategory,
    from: Option<ShelfCategory>,
    output: &Output,
) -> Result<()> {
    let from = from.unwrap_or_else(|| to.other());

    match shelf.move_book(&id, from, to).await {
        MoveOutcome::Moved => output.success(&format!(
            "Moved '{}' from {} to {}",
            id,
            from.label(),
            to.label()
        )),
        MoveOutcome::AlreadyInDestination => output.success(&format!(
            "Removed '{}' from {}; it was already in {}",
            id,
            from.label(),
            to.label()
        )),
        MoveOutcome::NotFound => bail!("'{}' is not in {}", id, from.label()),
    }

    Ok(())
}

/// Report whether a book is shelved, and where
pub async fn check(shelf: &SharedBookshelf<Backend>, id: String, output: &Output) -> Result<()> {
    let snapshot = shelf.load().await;
    let category = snapshot.category_of(&id);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "id": id,
                    "shelved": shelf.contains(&id).await,
                    "category": category.map(|c| c.as_str())
                })
            );
        }
        OutputFormat::Quiet => {
            if let Some(category) = category {
                println!("{}", category);
            }
        }
        OutputFormat::Human => match category {
            Some(category) => println!("'{}' is in {}", id, category.label()),
            None => println!("'{}' is not on your shelf", id),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookguide_core::{Bookshelf, MemoryStorage};
    use std::sync::Arc;

    fn shared() -> SharedBookshelf<Backend> {
        SharedBookshelf::new(Bookshelf::new(Arc::new(MemoryStorage::new()) as Backend))
    }

    fn book(id: &str) -> BookRecord {
        BookRecord::new(id).with_title(format!("Book {}", id))
    }

    #[tokio::test]
    async fn test_categories_holding() {
        let shelf = shared();
        shelf.add(book("1"), ShelfCategory::WantToRead).await;
        shelf.add(book("1"), ShelfCategory::Read).await;
        shelf.add(book("2"), ShelfCategory::Read).await;
        let snapshot = shelf.load().await;

        assert_eq!(
            categories_holding(&snapshot, "1", None),
            vec![ShelfCategory::WantToRead, ShelfCategory::Read]
        );
        assert_eq!(
            categories_holding(&snapshot, "1", Some(ShelfCategory::Read)),
            vec![ShelfCategory::Read]
        );
        assert!(categories_holding(&snapshot, "2", Some(ShelfCategory::WantToRead)).is_empty());
        assert!(categories_holding(&snapshot, "3", None).is_empty());
    }

    #[tokio::test]
    async fn test_remove_without_category_clears_every_category() {
        let shelf = shared();
        shelf.add(book("1"), ShelfCategory::WantToRead).await;
        shelf.add(book("1"), ShelfCategory::Read).await;
        shelf.add(book("2"), ShelfCategory::Read).await;

        remove(&shelf, "1".into(), None, true, &Output::new(OutputFormat::Quiet))
            .await
            .unwrap();

        assert!(!shelf.contains("1").await);
        assert!(shelf.contains("2").await);
    }

    #[tokio::test]
    async fn test_remove_with_category_keeps_the_other() {
        let shelf = shared();
        shelf.add(book("1"), ShelfCategory::WantToRead).await;
        shelf.add(book("1"), ShelfCategory::Read).await;

        remove(
            &shelf,
            "1".into(),
            Some(ShelfCategory::WantToRead),
            true,
            &Output::new(OutputFormat::Quiet),
        )
        .await
        .unwrap();

        let snapshot = shelf.load().await;
        assert!(!snapshot.contains_in(ShelfCategory::WantToRead, "1"));
        assert!(snapshot.contains_in(ShelfCategory::Read, "1"));
    }

    #[tokio::test]
    async fn test_remove_missing_book_is_not_an_error() {
        let shelf = shared();
        remove(&shelf, "9".into(), None, true, &Output::new(OutputFormat::Quiet))
            .await
            .unwrap();
        assert!(shelf.load().await.is_empty());
    }
}
