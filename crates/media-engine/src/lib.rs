//! Player engine for DreamFM audiobooks
//!
//! [`PlayerEngine`] is the synchronous state machine: it owns the open book,
//! the single live audio handle and the load tokens that keep late chapter
//! responses from clobbering newer ones. [`PlayerService`] drives it from a
//! tokio task and publishes a [`PlayerView`] after every event.

mod chapters;
mod decoder;
mod engine;
mod error;
mod notify;
mod output;
pub(crate) mod playback_thread;
mod projection;
mod resource;
mod service;
mod speaker;
mod speed;
mod state;

pub use chapters::{chapter_title, ChapterCursor, ChapterEntry};
pub use decoder::{AudioDecoder, DecodedAudio};
pub use engine::{AdvanceTimer, ChapterRequest, EngineConfig, PlayerEngine};
pub use error::{Boundary, EngineError, EngineResult};
pub use notify::{Notifier, Toast, ToastCenter};
pub use output::{AudioOutput, DeviceEvent, DeviceEventKind, DeviceEventSink};
pub use projection::{
    format_time, project, FullPlayerView, MiniPlayerView, PlayIcon, PlayerView, COVER_PLACEHOLDER,
};
pub use resource::{AudioHandle, HandleId, ResourceRegistry};
pub use service::{PlayerCommand, PlayerHandle, PlayerService, ServiceConfig};
pub use speaker::SpeakerOutput;
pub use speed::SpeedProcessor;
pub use state::{EngineState, PlaybackSession, SurfaceState};
pub use dreamfm_core::{PlaybackRate, RateCycle, Volume};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _ = PlaybackStatus::Stopped;
        let _ = EngineState::Idle;
        let _ = ResourceRegistry::new();
        let _ = ToastCenter::default();
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn test_error_display() {
        let error = EngineError::InvalidChapter { chapter: 5, total: 3 };
        assert!(error.to_string().contains('5'));
    }
}
