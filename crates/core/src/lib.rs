pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, Result};
pub use types::{BookId, BookMetadata, Catalog, PlaybackRate, RateCycle, Validator, Volume};
