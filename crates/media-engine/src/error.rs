// FILE: crates/media-engine/src/error.rs

use thiserror::Error;

/// Edge of the chapter range reached by navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    First,
    Last,
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Boundary::First => write!(f, "first"),
            Boundary::Last => write!(f, "last"),
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Chapter {chapter} unavailable: {reason}")]
    ChapterUnavailable { chapter: u32, reason: String },

    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    #[error("Already at the {0} chapter")]
    NavigationOutOfBounds(Boundary),

    #[error("No audio loaded")]
    NoActiveResource,

    #[error("Chapter {chapter} is outside 1..={total}")]
    InvalidChapter { chapter: u32, total: u32 },

    #[error("Invalid volume: {0}")]
    InvalidVolume(f32),

    #[error("Invalid book: {0}")]
    InvalidBook(String),

    #[error("No book is open")]
    NoBook,

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Seek error: {0}")]
    SeekError(String),

    #[error("Player is closed")]
    Closed,
}

impl EngineError {
    /// Text of the transient notification shown for this error, if any
    ///
    /// Only failures the listener can act on are surfaced; caller mistakes
    /// such as an out-of-range volume stay in the log.
    pub fn notification(&self) -> Option<String> {
        match self {
            EngineError::ChapterUnavailable { chapter, .. } => {
                Some(format!("Chapter {} not available", chapter))
            }
            EngineError::PlaybackRejected(_) => Some("Failed to play audio".to_string()),
            EngineError::NavigationOutOfBounds(Boundary::First) => {
                Some("First chapter".to_string())
            }
            EngineError::NavigationOutOfBounds(Boundary::Last) => Some("Last chapter".to_string()),
            EngineError::NoActiveResource => Some("No audio loaded".to_string()),
            EngineError::DecodeError(_) | EngineError::OutputError(_) => {
                Some("Audio file not found!".to_string())
            }
            EngineError::InvalidChapter { .. }
            | EngineError::InvalidVolume(_)
            | EngineError::InvalidBook(_)
            | EngineError::NoBook
            | EngineError::SeekError(_)
            | EngineError::Closed => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
