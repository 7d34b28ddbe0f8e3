//! Book reviews
//!
//! Reviews live in their own storage slot (`bookguide:reviews`) as a JSON
//! array and are independent of the bookshelf. Only the author of a review
//! may change or delete it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::session::Identity;
use crate::storage::{KeyValueStorage, StorageError};

/// Storage slot holding every review
pub const REVIEWS_KEY: &str = "bookguide:reviews";

/// Errors from review operations
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Review not found: {0}")]
    NotFound(String),

    #[error("Only the author can change this review (written by {author})")]
    NotAuthor { author: String },

    #[error("Invalid review: {0}")]
    Invalid(String),

    #[error("Stored reviews are unreadable: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A star rating from 1 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(stars: u8) -> Result<Self, ReviewError> {
        if (Self::MIN..=Self::MAX).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(ReviewError::Invalid(format!(
                "rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                stars
            )))
        }
    }

    pub fn stars(self) -> u8 {
        self.0
    }

    /// Rating drawn as filled and empty stars
    pub fn display(self) -> String {
        let filled = usize::from(self.0);
        let empty = usize::from(Self::MAX) - filled;
        format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
    }
}

impl TryFrom<u8> for Rating {
    type Error = ReviewError;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        Rating::new(stars)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

/// A stored review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub book_id: String,
    /// Email of the identity that wrote it
    pub author_id: String,
    pub title: String,
    pub text: String,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Check whether `identity` wrote this review
    pub fn is_written_by(&self, identity: &Identity) -> bool {
        self.author_id == identity.email
    }
}

/// User-supplied review content, not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    pub title: String,
    pub text: String,
    pub rating: u8,
}

impl ReviewDraft {
    pub fn new(title: impl Into<String>, text: impl Into<String>, rating: u8) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            rating,
        }
    }

    /// Trimmed title and text plus a checked rating
    fn validate(&self) -> Result<(String, String, Rating), ReviewError> {
        let title = self.title.trim();
        let text = self.text.trim();
        if title.is_empty() {
            return Err(ReviewError::Invalid("title cannot be empty".into()));
        }
        if text.is_empty() {
            return Err(ReviewError::Invalid("text cannot be empty".into()));
        }
        let rating = Rating::new(self.rating)?;
        Ok((title.to_string(), text.to_string(), rating))
    }
}

/// Durable list of reviews
pub struct ReviewStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> ReviewStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    fn read_all(&self) -> Result<Vec<Review>, ReviewError> {
        match self.storage.get_item(REVIEWS_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(ReviewError::Corrupt),
            None => Ok(Vec::new()),
        }
    }

    fn write_all(&self, reviews: &[Review]) -> Result<(), ReviewError> {
        let json = serde_json::to_string(reviews).map_err(ReviewError::Corrupt)?;
        self.storage.set_item(REVIEWS_KEY, &json)?;
        Ok(())
    }

    /// All reviews
    pub fn all(&self) -> Result<Vec<Review>, ReviewError> {
        self.read_all()
    }

    /// Reviews of one book, oldest first
    pub fn for_book(&self, book_id: &str) -> Result<Vec<Review>, ReviewError> {
        let mut reviews: Vec<Review> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.book_id == book_id)
            .collect();
        reviews.sort_by_key(|r| r.created_at);
        Ok(reviews)
    }

    /// Review by id
    pub fn get(&self, id: &str) -> Result<Option<Review>, ReviewError> {
        Ok(self.read_all()?.into_iter().find(|r| r.id == id))
    }

    /// Average rating of a book, if it has any reviews
    pub fn average_rating(&self, book_id: &str) -> Result<Option<f64>, ReviewError> {
        let reviews = self.for_book(book_id)?;
        if reviews.is_empty() {
            return Ok(None);
        }
        let total: u32 = reviews.iter().map(|r| u32::from(r.rating.stars())).sum();
        Ok(Some(f64::from(total) / reviews.len() as f64))
    }

    /// Write a new review of `book_id` as `author`
    pub fn create(
        &self,
        book_id: &str,
        draft: &ReviewDraft,
        author: &Identity,
    ) -> Result<Review, ReviewError> {
        let (title, text, rating) = draft.validate()?;
        if book_id.trim().is_empty() {
            return Err(ReviewError::Invalid("book id cannot be empty".into()));
        }

        let mut reviews = self.read_all()?;
        let review = Review {
            id: Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            author_id: author.email.clone(),
            title,
            text,
            rating,
            created_at: Utc::now(),
            updated_at: None,
        };
        reviews.push(review.clone());
        self.write_all(&reviews)?;

        debug!(id = %review.id, book_id, "created review");
        Ok(review)
    }

    /// Replace the content of a review written by `actor`
    pub fn update(
        &self,
        id: &str,
        draft: &ReviewDraft,
        actor: &Identity,
    ) -> Result<Review, ReviewError> {
        let (title, text, rating) = draft.validate()?;

        let mut reviews = self.read_all()?;
        let review = reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ReviewError::NotFound(id.to_string()))?;
        ensure_author(review, actor)?;

        review.title = title;
        review.text = text;
        review.rating = rating;
        review.updated_at = Some(Utc::now());
        let updated = review.clone();

        self.write_all(&reviews)?;
        debug!(%id, "updated review");
        Ok(updated)
    }

    /// Delete a review written by `actor`
    pub fn delete(&self, id: &str, actor: &Identity) -> Result<Review, ReviewError> {
        let mut reviews = self.read_all()?;
        let position = reviews
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ReviewError::NotFound(id.to_string()))?;
        ensure_author(&reviews[position], actor)?;

        let removed = reviews.remove(position);
        self.write_all(&reviews)?;
        debug!(%id, "deleted review");
        Ok(removed)
    }
}

fn ensure_author(review: &Review, actor: &Identity) -> Result<(), ReviewError> {
    if review.is_written_by(actor) {
        Ok(())
    } else {
        Err(ReviewError::NotAuthor {
            author: review.author_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn alice() -> Identity {
        Identity::new("alice@example.com", "token-a")
    }

    fn bob() -> Identity {
        Identity::new("bob@example.com", "token-b")
    }

    fn store() -> ReviewStore<MemoryStorage> {
        ReviewStore::new(MemoryStorage::new())
    }

    fn draft(title: &str) -> ReviewDraft {
        ReviewDraft::new(title, "Well written and informative.", 5)
    }

    #[test]
    fn test_create_and_list_by_book() {
        let store = store();

        let review = store.create("1", &draft("Great read"), &alice()).unwrap();
        store.create("1", &draft("Interesting"), &bob()).unwrap();
        store.create("2", &draft("Essential"), &alice()).unwrap();

        assert_eq!(review.author_id, "alice@example.com");
        assert!(review.updated_at.is_none());

        let for_one = store.for_book("1").unwrap();
        assert_eq!(for_one.len(), 2);
        assert_eq!(for_one[0].title, "Great read");
        assert_eq!(store.for_book("3").unwrap().len(), 0);
        assert_eq!(store.all().unwrap().len(), 3);
    }

    #[test]
    fn test_create_trims_and_validates() {
        let store = store();

        let review = store
            .create("1", &ReviewDraft::new("  Title ", " Body  ", 3), &alice())
            .unwrap();
        assert_eq!(review.title, "Title");
        assert_eq!(review.text, "Body");

        for bad in [
            ReviewDraft::new("", "Body", 3),
            ReviewDraft::new("Title", "   ", 3),
            ReviewDraft::new("Title", "Body", 0),
            ReviewDraft::new("Title", "Body", 6),
        ] {
            let err = store.create("1", &bad, &alice()).unwrap_err();
            assert!(matches!(err, ReviewError::Invalid(_)));
        }
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[test]
    fn test_update_by_author() {
        let store = store();
        let review = store.create("1", &draft("First take"), &alice()).unwrap();

        let updated = store
            .update(&review.id, &ReviewDraft::new("Second take", "Changed my mind.", 2), &alice())
            .unwrap();

        assert_eq!(updated.title, "Second take");
        assert_eq!(updated.rating.stars(), 2);
        assert_eq!(updated.created_at, review.created_at);
        assert!(updated.updated_at.is_some());
        assert_eq!(store.get(&review.id).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_update_by_other_user_rejected() {
        let store = store();
        let review = store.create("1", &draft("Mine"), &alice()).unwrap();

        let err = store.update(&review.id, &draft("Hijacked"), &bob()).unwrap_err();
        assert!(matches!(err, ReviewError::NotAuthor { ref author } if author == "alice@example.com"));
        assert_eq!(store.get(&review.id).unwrap().unwrap().title, "Mine");
    }

    #[test]
    fn test_update_missing_review() {
        let err = store().update("nope", &draft("x"), &alice()).unwrap_err();
        assert!(matches!(err, ReviewError::NotFound(_)));
    }

    #[test]
    fn test_delete() {
        let store = store();
        let review = store.create("1", &draft("Bye"), &alice()).unwrap();

        let err = store.delete(&review.id, &bob()).unwrap_err();
        assert!(matches!(err, ReviewError::NotAuthor { .. }));

        let removed = store.delete(&review.id, &alice()).unwrap();
        assert_eq!(removed.id, review.id);
        assert!(store.get(&review.id).unwrap().is_none());

        let err = store.delete(&review.id, &alice()).unwrap_err();
        assert!(matches!(err, ReviewError::NotFound(_)));
    }

    #[test]
    fn test_average_rating() {
        let store = store();
        assert_eq!(store.average_rating("1").unwrap(), None);

        store.create("1", &ReviewDraft::new("a", "a", 5), &alice()).unwrap();
        store.create("1", &ReviewDraft::new("b", "b", 3), &bob()).unwrap();

        assert_eq!(store.average_rating("1").unwrap(), Some(4.0));
    }

    #[test]
    fn test_reviews_survive_new_store() {
        let storage = Arc::new(MemoryStorage::new());
        let id = ReviewStore::new(storage.clone())
            .create("1", &draft("Persisted"), &alice())
            .unwrap()
            .id;

        let reopened = ReviewStore::new(storage);
        assert_eq!(reopened.get(&id).unwrap().unwrap().title, "Persisted");
    }

    #[test]
    fn test_corrupt_slot_is_reported() {
        let store = ReviewStore::new(MemoryStorage::with_item(REVIEWS_KEY, "[{"));
        assert!(matches!(store.all().unwrap_err(), ReviewError::Corrupt(_)));
    }

    #[test]
    fn test_rating_serde_rejects_out_of_range() {
        assert_eq!(serde_json::to_string(&Rating::new(4).unwrap()).unwrap(), "4");
        assert!(serde_json::from_str::<Rating>("9").is_err());
        assert_eq!(Rating::new(3).unwrap().display(), "★★★☆☆");
    }

    #[test]
    fn test_review_json_is_camel_case() {
        let store = store();
        store.create("1", &draft("Shape"), &alice()).unwrap();

        let raw = store.storage.get_item(REVIEWS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["bookId"], "1");
        assert_eq!(value[0]["authorId"], "alice@example.com");
        assert!(value[0].get("updatedAt").is_none());
    }
}
