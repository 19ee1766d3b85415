//! Book domain models

use crate::types::Validator;
use serde::{Deserialize, Serialize};

/// Unique identifier for a catalog book (the document id in the catalog)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Creates a BookId from a document id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BookId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Metadata snapshot for one audiobook, as stored in the catalog
///
/// Field names follow the catalog documents (`coverUrl`, `audioSlug`,
/// `totalChapters`). Everything the player does not need is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    /// Document id. Catalog documents usually carry it outside the body.
    #[serde(default)]
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub narrator: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Opaque per-book identifier used to build chapter locators
    pub audio_slug: String,
    pub total_chapters: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Human readable running time, e.g. "2h 30m"
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub plays: Option<u64>,
}

impl BookMetadata {
    /// Placeholder shown when a book has no author
    pub const UNKNOWN_AUTHOR: &'static str = "Unknown Author";

    /// Creates metadata with the fields the player requires
    pub fn new(
        id: impl Into<BookId>,
        title: impl Into<String>,
        audio_slug: impl Into<String>,
        total_chapters: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: None,
            narrator: None,
            cover_url: None,
            audio_slug: audio_slug.into(),
            total_chapters,
            description: None,
            category: None,
            language: None,
            duration: None,
            rating: None,
            plays: None,
        }
    }

    /// Sets the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Sets the cover image reference
    pub fn with_cover_url(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }

    /// Author for display, falling back to a placeholder
    pub fn display_author(&self) -> &str {
        self.author
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(Self::UNKNOWN_AUTHOR)
    }

    /// Returns true if `chapter` is a valid 1-based chapter number for this book
    pub fn has_chapter(&self, chapter: u32) -> bool {
        (1..=self.total_chapters).contains(&chapter)
    }
}

impl Validator for BookMetadata {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        if self.audio_slug.trim().is_empty() {
            errors.push("Audio slug cannot be empty".to_string());
        } else if self.audio_slug.contains('/') {
            errors.push("Audio slug cannot contain '/'".to_string());
        }

        if self.total_chapters == 0 {
            errors.push("Book must have at least one chapter".to_string());
        }

        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                errors.push("Rating must be between 0 and 5".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
