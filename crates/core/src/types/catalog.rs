//! Cached catalog of audiobooks
//!
//! The catalog is the player's only view of the document store: a snapshot of
//! book metadata loaded once and looked up by id when a book is opened.

use crate::error::{AppError, Result};
use crate::types::{BookId, BookMetadata, Validator};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Accepted catalog file layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    /// `[ { "id": "...", ... }, ... ]`
    List(Vec<BookMetadata>),
    /// `{ "docId": { ... }, ... }`, the shape of a collection export
    Keyed(BTreeMap<String, BookMetadata>),
}

/// In-memory snapshot of catalog metadata, in catalog order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: Vec<BookMetadata>,
}

impl Catalog {
    /// Creates a catalog from already-loaded books
    pub fn new(books: Vec<BookMetadata>) -> Self {
        Self { books }
    }

    /// Parses a catalog from JSON text
    ///
    /// Documents that fail validation are skipped with a warning rather than
    /// failing the whole catalog.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: CatalogDocument =
            serde_json::from_str(json).map_err(|source| AppError::CatalogParse { source })?;

        let candidates: Vec<BookMetadata> = match document {
            CatalogDocument::List(books) => books,
            CatalogDocument::Keyed(map) => map
                .into_iter()
                .map(|(id, mut book)| {
                    if book.id.is_blank() {
                        book.id = BookId::new(id);
                    }
                    book
                })
                .collect(),
        };

        let mut books = Vec::with_capacity(candidates.len());
        for book in candidates {
            if book.id.is_blank() {
                log::warn!("Skipping catalog entry '{}' without an id", book.title);
                continue;
            }
            if let Err(reasons) = book.validate() {
                let err = AppError::InvalidMetadata {
                    id: book.id.to_string(),
                    reasons,
                };
                log::warn!("Skipping catalog entry: {}", err);
                continue;
            }
            books.push(book);
        }

        if books.is_empty() {
            return Err(AppError::EmptyCatalog);
        }

        log::info!("Loaded {} audiobooks", books.len());
        Ok(Self { books })
    }

    /// Loads a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| AppError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Looks up a book by id
    pub fn get(&self, id: &BookId) -> Option<&BookMetadata> {
        self.books.iter().find(|b| &b.id == id)
    }

    /// Returns an owned metadata snapshot for the player to take
    pub fn open_book(&self, id: &BookId) -> Result<BookMetadata> {
        self.get(id).cloned().ok_or_else(|| {
            log::error!("Book not found: {}", id);
            AppError::BookNotFound { id: id.to_string() }
        })
    }

    /// All books in catalog order
    pub fn books(&self) -> &[BookMetadata] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = r#"[
        {"id": "b1", "title": "First", "audioSlug": "first", "totalChapters": 3},
        {"id": "b2", "title": "Second", "author": "A. Writer", "audioSlug": "second", "totalChapters": 12}
    ]"#;

    #[test]
    fn test_parse_list() {
        let catalog = Catalog::from_json_str(LIST).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.books()[0].title, "First");
    }

    #[test]
    fn test_parse_keyed_assigns_ids() {
        let json = r#"{
            "docA": {"title": "Keyed", "audioSlug": "keyed", "totalChapters": 2}
        }"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        let book = catalog.get(&BookId::new("docA")).unwrap();
        assert_eq!(book.title, "Keyed");
    }

    #[test]
    fn test_invalid_entries_skipped() {
        let json = r#"[
            {"id": "ok", "title": "Ok", "audioSlug": "ok", "totalChapters": 1},
            {"id": "bad", "title": "Bad", "audioSlug": "bad", "totalChapters": 0},
            {"title": "No id", "audioSlug": "noid", "totalChapters": 1}
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_empty_catalog_is_error() {
        let result = Catalog::from_json_str("[]");
        assert!(matches!(result, Err(AppError::EmptyCatalog)));
    }

    #[test]
    fn test_malformed_json() {
        let result = Catalog::from_json_str("{ not json");
        assert!(matches!(result, Err(AppError::CatalogParse { .. })));
    }

    #[test]
    fn test_open_book_returns_snapshot() {
        let catalog = Catalog::from_json_str(LIST).unwrap();
        let mut book = catalog.open_book(&BookId::new("b2")).unwrap();
        book.title = "Changed".to_string();
        assert_eq!(catalog.get(&BookId::new("b2")).unwrap().title, "Second");
    }

    #[test]
    fn test_open_unknown_book() {
        let catalog = Catalog::from_json_str(LIST).unwrap();
        let err = catalog.open_book(&BookId::new("zzz")).unwrap_err();
        assert_eq!(err.user_message(), "Book not found!");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, LIST).unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(AppError::CatalogRead { .. })));
    }
}
