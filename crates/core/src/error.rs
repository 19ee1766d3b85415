//! Error types for the DreamFM catalog layer
//!
//! Errors carry a severity so callers can decide whether to keep going:
//! - **Recoverable**: the user can retry (book missing from a stale catalog)
//! - **Degraded**: part of the catalog is unusable but the rest works
//! - **Fatal**: the catalog cannot be used at all

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// User can retry
    Recoverable,
    /// Feature degraded but app can continue
    Degraded,
    /// Catalog unusable
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for catalog and metadata handling
#[derive(Error, Debug)]
pub enum AppError {
    /// Book id not present in the cached catalog
    #[error("Book not found: {id}")]
    BookNotFound { id: String },

    /// Catalog document failed validation
    #[error("Invalid metadata for book '{id}': {}", reasons.join("; "))]
    InvalidMetadata { id: String, reasons: Vec<String> },

    /// Catalog file could not be read
    #[error("Failed to read catalog at {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Catalog file is not valid JSON or has the wrong shape
    #[error("Failed to parse catalog: {source}")]
    CatalogParse {
        #[source]
        source: serde_json::Error,
    },

    /// Catalog parsed but holds no books
    #[error("Catalog is empty")]
    EmptyCatalog,
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::BookNotFound { .. } => ErrorSeverity::Recoverable,
            Self::InvalidMetadata { .. } | Self::EmptyCatalog => ErrorSeverity::Degraded,
            Self::CatalogRead { .. } | Self::CatalogParse { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns a short message suitable for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            Self::BookNotFound { .. } => "Book not found!".to_string(),
            Self::InvalidMetadata { .. } => "This book cannot be played.".to_string(),
            Self::EmptyCatalog => "No audiobooks yet".to_string(),
            Self::CatalogRead { .. } | Self::CatalogParse { .. } => {
                "Error Loading Audiobooks".to_string()
            }
        }
    }

    /// Returns true if this error prevents the catalog from being used
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, AppError>;
