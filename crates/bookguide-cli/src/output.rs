//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use bookguide_core::{BookRecord, NearbyLibrary, Review, ShelfCategory};
use chrono::Local;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single book, with its place on the shelf when known
    pub fn print_book(&self, book: &BookRecord, shelved: Option<ShelfCategory>) {
        match self.format {
            OutputFormat::Human => {
                let info = &book.volume_info;
                println!("ID:          {}", book.id);
                println!("Title:       {}", book.title());
                println!("Authors:     {}", book.authors_display());
                if let Some(ref date) = info.published_date {
                    println!("Published:   {}", date);
                }
                if let Some(pages) = info.page_count {
                    println!("Pages:       {}", pages);
                }
                for isbn in &info.industry_identifiers {
                    println!("{:<12} {}", format!("{}:", isbn.kind), isbn.identifier);
                }
                println!(
                    "Shelf:       {}",
                    shelved.map(|c| c.label()).unwrap_or("(not shelved)")
                );
                if let Some(ref desc) = info.description {
                    println!();
                    println!("{}", desc);
                }
            }
            OutputFormat::Json => {
                let mut value = serde_json::to_value(book).unwrap_or_default();
                value["shelf"] = serde_json::json!(shelved.map(|c| c.as_str()));
                println!("{}", serde_json::to_string_pretty(&value).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", book.id);
            }
        }
    }

    /// Print a list of books
    pub fn print_books(&self, books: &[BookRecord]) {
        match self.format {
            OutputFormat::Human => {
                if books.is_empty() {
                    println!("No books found.");
                    return;
                }
                for book in books {
                    println!(
                        "{} | {} | {}",
                        truncate(&book.id, 14),
                        truncate(book.title(), 40),
                        truncate(&book.authors_display(), 30)
                    );
                }
                println!("\n{} book(s)", books.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(books).unwrap());
            }
            OutputFormat::Quiet => {
                for book in books {
                    println!("{}", book.id);
                }
            }
        }
    }

    /// Print reviews of a book
    pub fn print_reviews(&self, reviews: &[Review], average: Option<f64>) {
        match self.format {
            OutputFormat::Human => {
                if reviews.is_empty() {
                    println!("No reviews yet.");
                    return;
                }
                for review in reviews {
                    println!("────────────────────────────────────────");
                    println!(
                        "ID: {}  {}  by {} on {}",
                        review.id.get(..8).unwrap_or(&review.id),
                        review.rating.display(),
                        review.author_id,
                        review
                            .created_at
                            .with_timezone(&Local)
                            .format("%Y-%m-%d %H:%M")
                    );
                    println!("Title: {}", review.title);
                    println!();
                    println!("{}", review.text);
                    println!();
                }
                match average {
                    Some(avg) => println!("{} review(s), average {:.1}/5", reviews.len(), avg),
                    None => println!("{} review(s)", reviews.len()),
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "reviews": reviews,
                        "average_rating": average
                    }))
                    .unwrap()
                );
            }
            OutputFormat::Quiet => {
                for review in reviews {
                    println!("{}", review.id);
                }
            }
        }
    }

    /// Print a single review
    pub fn print_review(&self, review: &Review) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", review.id);
                println!("Book:    {}", review.book_id);
                println!("Author:  {}", review.author_id);
                println!("Rating:  {}", review.rating.display());
                println!("Title:   {}", review.title);
                if let Some(updated) = review.updated_at {
                    println!(
                        "Updated: {}",
                        updated.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                    );
                }
                println!();
                println!("{}", review.text);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(review).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", review.id);
            }
        }
    }

    /// Print libraries near the search origin
    pub fn print_libraries(&self, libraries: &[NearbyLibrary], radius_km: f64) {
        match self.format {
            OutputFormat::Human => {
                if libraries.is_empty() {
                    println!("No libraries within {} km.", radius_km);
                    return;
                }
                for nearby in libraries {
                    let library = &nearby.library;
                    println!(
                        "{:>6.1} km | {} | {}",
                        nearby.distance_km,
                        truncate(&library.name, 35),
                        truncate(&library.address, 40)
                    );
                    if !library.opening_hours.is_empty() {
                        println!("          | open {}", library.opening_hours);
                    }
                }
                println!("\n{} library(ies) within {} km", libraries.len(), radius_km);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(libraries).unwrap());
            }
            OutputFormat::Quiet => {
                for nearby in libraries {
                    println!("{}", nearby.library.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Report an operation that did nothing, without failing
    pub fn unchanged(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("• {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "unchanged", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("Memórias Póstumas", 8), "Memór...");
        assert_eq!(truncate("São Paulo", 9), "São Paulo");
    }
}
