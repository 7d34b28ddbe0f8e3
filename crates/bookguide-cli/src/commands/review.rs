//! Review command handlers

use anyhow::Result;

use bookguide_core::{ReviewDraft, ReviewError, ReviewStore, SessionStore};

use super::{session::require_identity, Backend};
use crate::editor::{confirm, edit_text};
use crate::output::Output;

/// List the reviews of a book
pub fn list(reviews: &ReviewStore<Backend>, book_id: String, output: &Output) -> Result<()> {
    let found = reviews.for_book(&book_id)?;
    let average = reviews.average_rating(&book_id)?;
    output.print_reviews(&found, average);
    Ok(())
}

/// Review a book as the signed-in user
pub fn add(
    reviews: &ReviewStore<Backend>,
    session: &SessionStore<Backend>,
    book_id: String,
    title: String,
    rating: u8,
    text: Option<String>,
    output: &Output,
) -> Result<()> {
    let identity = require_identity(session)?;

    let text = match text {
        Some(text) => text,
        None => edit_text("")?,
    };

    let review = reviews.create(&book_id, &ReviewDraft::new(title, text, rating), &identity)?;

    output.success(&format!("Reviewed {}: {}", book_id, review.rating.display()));
    output.print_review(&review);

    Ok(())
}

/// Edit one of your own reviews
///
/// Fields not given keep their current value. With no flags at all the text
/// opens in the editor.
pub fn edit(
    reviews: &ReviewStore<Backend>,
    session: &SessionStore<Backend>,
    id: String,
    title: Option<String>,
    rating: Option<u8>,
    text: Option<String>,
    output: &Output,
) -> Result<()> {
    let identity = require_identity(session)?;

    let existing = reviews
        .get(&id)?
        .ok_or_else(|| ReviewError::NotFound(id.clone()))?;
    if !existing.is_written_by(&identity) {
        return Err(ReviewError::NotAuthor {
            author: existing.author_id,
        }
        .into());
    }

    let text = match text {
        Some(text) => text,
        None if title.is_none() && rating.is_none() => edit_text(&existing.text)?,
        None => existing.text.clone(),
    };
    let draft = ReviewDraft::new(
        title.unwrap_or_else(|| existing.title.clone()),
        text,
        rating.unwrap_or_else(|| existing.rating.stars()),
    );

    let review = reviews.update(&id, &draft, &identity)?;

    output.success("Review updated");
    output.print_review(&review);

    Ok(())
}

/// Delete one of your own reviews
pub fn delete(
    reviews: &ReviewStore<Backend>,
    session: &SessionStore<Backend>,
    id: String,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let identity = require_identity(session)?;

    let existing = reviews
        .get(&id)?
        .ok_or_else(|| ReviewError::NotFound(id.clone()))?;

    if output.should_prompt() && !yes && existing.is_written_by(&identity) {
        println!(
            "Delete review: {} - {} ({})",
            existing.book_id,
            existing.title,
            existing.rating.display()
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = reviews.delete(&id, &identity)?;

    output.success(&format!("Deleted review: {}", removed.id));

    Ok(())
}
