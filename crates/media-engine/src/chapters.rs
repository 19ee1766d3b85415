// FILE: crates/media-engine/src/chapters.rs
//! Chapter navigation
//!
//! Chapters are 1-based and addressed only by number; a book with
//! `total_chapters = N` has chapters `1..=N`.

use crate::error::{Boundary, EngineError, EngineResult};

/// One row of the chapter list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub number: u32,
    pub title: String,
    pub active: bool,
}

/// Display title of a chapter
pub fn chapter_title(number: u32) -> String {
    format!("Chapter {}", number)
}

/// Position within a book's chapters, always inside `1..=total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterCursor {
    current: u32,
    total: u32,
}

impl ChapterCursor {
    /// Creates a cursor on chapter 1
    pub fn new(total: u32) -> EngineResult<Self> {
        if total == 0 {
            return Err(EngineError::InvalidChapter { chapter: 1, total });
        }
        Ok(Self { current: 1, total })
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn contains(&self, chapter: u32) -> bool {
        (1..=self.total).contains(&chapter)
    }

    pub fn is_first(&self) -> bool {
        self.current == 1
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total
    }

    /// Number of the following chapter, or the boundary that was hit
    pub fn next(&self) -> Result<u32, Boundary> {
        if self.is_last() {
            Err(Boundary::Last)
        } else {
            Ok(self.current + 1)
        }
    }

    /// Number of the preceding chapter, or the boundary that was hit
    pub fn previous(&self) -> Result<u32, Boundary> {
        if self.is_first() {
            Err(Boundary::First)
        } else {
            Ok(self.current - 1)
        }
    }

    /// Moves to `chapter`, leaving the cursor untouched when it is out of range
    pub fn go_to(&mut self, chapter: u32) -> EngineResult<()> {
        if !self.contains(chapter) {
            return Err(EngineError::InvalidChapter {
                chapter,
                total: self.total,
            });
        }
        self.current = chapter;
        Ok(())
    }

    /// Label such as "Chapter 3 of 12"
    pub fn label(&self) -> String {
        format!("Chapter {} of {}", self.current, self.total)
    }

    /// Every chapter in order, with the current one marked
    pub fn entries(&self) -> Vec<ChapterEntry> {
        (1..=self.total)
            .map(|number| ChapterEntry {
                number,
                title: chapter_title(number),
                active: number == self.current,
            })
            .collect()
    }
}
