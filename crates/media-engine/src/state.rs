//! Engine state management

use crate::chapters::ChapterCursor;
use crate::error::EngineResult;
use crate::resource::AudioHandle;
use crate::PlaybackStatus;
use dreamfm_core::{BookMetadata, PlaybackRate, RateCycle, Volume};

/// Where the engine is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No book open yet
    Idle,
    /// A chapter fetch is in flight
    Loading,
    /// Not producing audio; a handle may or may not be bound
    Ready,
    /// The device confirmed playback
    Playing,
    /// Player dismissed; only `open` is accepted
    Closed,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EngineState::Idle => "idle",
            EngineState::Loading => "loading",
            EngineState::Ready => "ready",
            EngineState::Playing => "playing",
            EngineState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Visibility of the two player surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceState {
    pub mini_visible: bool,
    pub full_open: bool,
    pub chapter_list_open: bool,
}

/// Everything known about the book currently open in the player
#[derive(Debug)]
pub struct PlaybackSession {
    book: BookMetadata,
    chapters: ChapterCursor,
    play_state: PlaybackStatus,
    rates: RateCycle,
    volume: Volume,
    handle: Option<AudioHandle>,
    duration: Option<f64>,
    position: f64,
}

impl PlaybackSession {
    /// Starts a session on chapter 1 of `book`
    pub fn new(book: BookMetadata, rates: RateCycle, volume: Volume) -> EngineResult<Self> {
        let chapters = ChapterCursor::new(book.total_chapters)?;
        Ok(Self {
            book,
            chapters,
            play_state: PlaybackStatus::Stopped,
            rates,
            volume,
            handle: None,
            duration: None,
            position: 0.0,
        })
    }

    pub fn book(&self) -> &BookMetadata {
        &self.book
    }

    pub fn chapters(&self) -> &ChapterCursor {
        &self.chapters
    }

    pub fn current_chapter(&self) -> u32 {
        self.chapters.current()
    }

    pub fn play_state(&self) -> PlaybackStatus {
        self.play_state
    }

    pub fn rate(&self) -> PlaybackRate {
        self.rates.current()
    }

    pub fn rates(&self) -> &RateCycle {
        &self.rates
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn active_handle(&self) -> Option<&AudioHandle> {
        self.handle.as_ref()
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// Duration in seconds, once the device has reported it
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Fraction of the chapter played, 0 while the duration is unknown
    pub fn progress(&self) -> f64 {
        match self.duration {
            Some(duration) if duration.is_finite() && duration > 0.0 => {
                (self.position / duration).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub(crate) fn chapters_mut(&mut self) -> &mut ChapterCursor {
        &mut self.chapters
    }

    pub(crate) fn set_play_state(&mut self, state: PlaybackStatus) {
        self.play_state = state;
    }

    pub(crate) fn rates_mut(&mut self) -> &mut RateCycle {
        &mut self.rates
    }

    pub(crate) fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
    }

    /// Installs a new handle and returns the one it replaces
    pub(crate) fn replace_handle(&mut self, handle: Option<AudioHandle>) -> Option<AudioHandle> {
        self.duration = None;
        self.position = 0.0;
        std::mem::replace(&mut self.handle, handle)
    }

    pub(crate) fn set_duration(&mut self, duration: f64) {
        self.duration = Some(duration);
    }

    pub(crate) fn set_position(&mut self, position: f64) {
        self.position = position.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceRegistry;
    use bytes::Bytes;

    fn session(total: u32) -> PlaybackSession {
        let book = BookMetadata::new("b1", "Book", "book", total);
        PlaybackSession::new(book, RateCycle::default(), Volume::MAX).unwrap()
    }

    #[test]
    fn test_new_session() {
        let session = session(3);
        assert_eq!(session.current_chapter(), 1);
        assert_eq!(session.play_state(), PlaybackStatus::Stopped);
        assert!(!session.has_handle());
        assert_eq!(session.duration(), None);
        assert_eq!(session.rate().value(), 1.0);
    }

    #[test]
    fn test_book_without_chapters_rejected() {
        let book = BookMetadata::new("b1", "Book", "book", 0);
        assert!(PlaybackSession::new(book, RateCycle::default(), Volume::MAX).is_err());
    }

    #[test]
    fn test_progress() {
        let mut session = session(1);
        session.set_position(30.0);
        assert_eq!(session.progress(), 0.0);

        session.set_duration(120.0);
        assert_eq!(session.progress(), 0.25);

        session.set_duration(f64::NAN);
        assert_eq!(session.progress(), 0.0);
    }

    #[test]
    fn test_replace_handle_resets_timing() {
        let registry = ResourceRegistry::new();
        let mut session = session(2);
        session.replace_handle(Some(registry.create(Bytes::new())));
        session.set_duration(60.0);
        session.set_position(10.0);

        let old = session.replace_handle(Some(registry.create(Bytes::new())));
        assert!(old.is_some());
        assert_eq!(session.duration(), None);
        assert_eq!(session.position(), 0.0);
    }
}
