// crates/media-engine/src/projection.rs
//! Session to display projection
//!
//! Pure functions only: a [`PlayerView`] can be re-derived at any moment from
//! the engine state, the session and surface visibility, without touching a
//! device or a renderer.

use crate::chapters::{chapter_title, ChapterEntry};
use crate::state::{EngineState, PlaybackSession, SurfaceState};

/// Cover shown when a book has none
pub const COVER_PLACEHOLDER: &str = "https://via.placeholder.com/200x300/ab47bc/FFFFFF?text=DreamFM";

/// Formats seconds as `M:SS`, or `H:MM:SS` from one hour up
///
/// Non-finite and negative input renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Transport button glyph; both surfaces always agree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayIcon {
    /// Shown while not playing
    Play,
    /// Shown while playing
    Pause,
}

impl PlayIcon {
    pub fn symbol(&self) -> &'static str {
        match self {
            PlayIcon::Play => "▶",
            PlayIcon::Pause => "⏸",
        }
    }
}

/// Compact persistent bar
#[derive(Debug, Clone, PartialEq)]
pub struct MiniPlayerView {
    pub visible: bool,
    pub cover_url: String,
    pub title: String,
    pub chapter_title: String,
    pub play_icon: PlayIcon,
    pub progress: f64,
}

/// Expanded player
#[derive(Debug, Clone, PartialEq)]
pub struct FullPlayerView {
    pub visible: bool,
    pub cover_url: String,
    pub title: String,
    pub author: String,
    pub chapter_title: String,
    pub chapter_label: String,
    pub elapsed: String,
    pub duration: String,
    pub progress: f64,
    pub play_icon: PlayIcon,
    pub rate_label: String,
    pub volume_percent: u8,
    pub chapters: Vec<ChapterEntry>,
    pub chapter_list_visible: bool,
}

/// Everything a front-end needs to draw the player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub state: EngineState,
    pub current_chapter: Option<u32>,
    pub mini: MiniPlayerView,
    pub full: FullPlayerView,
}

impl PlayerView {
    /// View with no book open and both surfaces hidden
    pub fn empty(state: EngineState) -> Self {
        Self {
            state,
            current_chapter: None,
            mini: MiniPlayerView {
                visible: false,
                cover_url: COVER_PLACEHOLDER.to_string(),
                title: String::new(),
                chapter_title: String::new(),
                play_icon: PlayIcon::Play,
                progress: 0.0,
            },
            full: FullPlayerView {
                visible: false,
                cover_url: COVER_PLACEHOLDER.to_string(),
                title: String::new(),
                author: String::new(),
                chapter_title: String::new(),
                chapter_label: String::new(),
                elapsed: format_time(0.0),
                duration: format_time(0.0),
                progress: 0.0,
                play_icon: PlayIcon::Play,
                rate_label: String::new(),
                volume_percent: 0,
                chapters: Vec::new(),
                chapter_list_visible: false,
            },
        }
    }
}

/// Projects the player state into both surfaces
pub fn project(
    state: EngineState,
    session: Option<&PlaybackSession>,
    surfaces: SurfaceState,
) -> PlayerView {
    let session = match session {
        Some(session) if state != EngineState::Closed => session,
        _ => return PlayerView::empty(state),
    };

    let book = session.book();
    let chapter = session.current_chapter();
    let cover_url = book
        .cover_url
        .clone()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| COVER_PLACEHOLDER.to_string());
    let play_icon = if state == EngineState::Playing {
        PlayIcon::Pause
    } else {
        PlayIcon::Play
    };
    let progress = session.progress();

    PlayerView {
        state,
        current_chapter: Some(chapter),
        mini: MiniPlayerView {
            visible: surfaces.mini_visible,
            cover_url: cover_url.clone(),
            title: book.title.clone(),
            chapter_title: chapter_title(chapter),
            play_icon,
            progress,
        },
        full: FullPlayerView {
            visible: surfaces.full_open,
            cover_url,
            title: book.title.clone(),
            author: book.display_author().to_string(),
            chapter_title: chapter_title(chapter),
            chapter_label: session.chapters().label(),
            elapsed: format_time(session.position()),
            duration: format_time(session.duration().unwrap_or(0.0)),
            progress,
            play_icon,
            rate_label: session.rate().to_string(),
            volume_percent: session.volume().as_percent(),
            chapters: session.chapters().entries(),
            chapter_list_visible: surfaces.chapter_list_open,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreamfm_core::{BookMetadata, RateCycle, Volume};

    fn session() -> PlaybackSession {
        let book = BookMetadata::new("b1", "The Long Road", "long-road", 2);
        PlaybackSession::new(book, RateCycle::default(), Volume::from_percent(70)).unwrap()
    }

    fn shown() -> SurfaceState {
        SurfaceState {
            mini_visible: true,
            full_open: true,
            chapter_list_open: false,
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(45.0), "0:45");
        assert_eq!(format_time(125.0), "2:05");
        assert_eq!(format_time(125.9), "2:05");
        assert_eq!(format_time(3599.0), "59:59");
        assert_eq!(format_time(3600.0), "1:00:00");
        assert_eq!(format_time(3725.0), "1:02:05");
        assert_eq!(format_time(36000.0), "10:00:00");
    }

    #[test]
    fn test_format_time_degenerate_input() {
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
        assert_eq!(format_time(-5.0), "0:00");
    }

    #[test]
    fn test_projection_of_fresh_session() {
        let session = session();
        let view = project(EngineState::Ready, Some(&session), shown());

        assert_eq!(view.current_chapter, Some(1));
        assert_eq!(view.mini.title, "The Long Road");
        assert_eq!(view.mini.chapter_title, "Chapter 1");
        assert_eq!(view.full.chapter_label, "Chapter 1 of 2");
        assert_eq!(view.full.author, "Unknown Author");
        assert_eq!(view.full.cover_url, COVER_PLACEHOLDER);
        assert_eq!(view.full.duration, "0:00");
        assert_eq!(view.full.rate_label, "1x");
        assert_eq!(view.full.volume_percent, 70);
        assert_eq!(view.full.chapters.len(), 2);
        assert_eq!(view.mini.play_icon, PlayIcon::Play);
    }

    #[test]
    fn test_icons_follow_playing_state_only() {
        let session = session();
        for state in [EngineState::Loading, EngineState::Ready, EngineState::Idle] {
            let view = project(state, Some(&session), shown());
            assert_eq!(view.mini.play_icon, PlayIcon::Play);
            assert_eq!(view.full.play_icon, PlayIcon::Play);
        }

        let view = project(EngineState::Playing, Some(&session), shown());
        assert_eq!(view.mini.play_icon, PlayIcon::Pause);
        assert_eq!(view.full.play_icon, PlayIcon::Pause);
    }

    #[test]
    fn test_timing_fields() {
        let mut session = session();
        session.set_duration(3725.0);
        session.set_position(125.0);

        let view = project(EngineState::Playing, Some(&session), shown());
        assert_eq!(view.full.elapsed, "2:05");
        assert_eq!(view.full.duration, "1:02:05");
        assert!((view.mini.progress - 125.0 / 3725.0).abs() < 1e-9);
        assert_eq!(view.mini.progress, view.full.progress);
    }

    #[test]
    fn test_closed_hides_everything() {
        let session = session();
        let view = project(EngineState::Closed, Some(&session), shown());
        assert!(!view.mini.visible);
        assert!(!view.full.visible);
        assert_eq!(view.current_chapter, None);
    }

    #[test]
    fn test_projection_is_repeatable() {
        let session = session();
        let a = project(EngineState::Ready, Some(&session), shown());
        let b = project(EngineState::Ready, Some(&session), shown());
        assert_eq!(a, b);
    }
}
