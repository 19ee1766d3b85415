//! Player engine state machine
//!
//! Every operation is a synchronous method that runs to completion. Work that
//! has to happen later is handed back to the caller instead of awaited: a
//! [`ChapterRequest`] to fetch, or an [`AdvanceTimer`] to arm. The caller
//! reports the outcome through [`PlayerEngine::complete_load`] and
//! [`PlayerEngine::advance_timer_fired`], and forwards device events to
//! [`PlayerEngine::handle_device_event`].

use crate::error::{EngineError, EngineResult};
use crate::notify::Notifier;
use crate::output::{AudioOutput, DeviceEvent, DeviceEventKind};
use crate::projection::{project, PlayerView};
use crate::resource::ResourceRegistry;
use crate::state::{EngineState, PlaybackSession, SurfaceState};
use crate::PlaybackStatus;
use bytes::Bytes;
use dreamfm_core::{BookMetadata, PlaybackRate, RateCycle, Validator, Volume};
use dreamfm_network::NetworkResult;
use std::sync::Arc;
use std::time::Duration;

/// Engine behavior settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub rates: RateCycle,
    pub initial_volume: Volume,
    pub auto_advance: bool,
    pub auto_advance_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rates: RateCycle::default(),
            initial_volume: Volume::MAX,
            auto_advance: true,
            auto_advance_delay: Duration::from_millis(1000),
        }
    }
}

/// A chapter fetch the caller must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRequest {
    /// Identifies this load; only the latest token is accepted back
    pub token: u64,
    pub audio_slug: String,
    pub chapter: u32,
}

/// A delayed auto-advance the caller must schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceTimer {
    pub token: u64,
    pub delay: Duration,
}

pub struct PlayerEngine {
    config: EngineConfig,
    output: Box<dyn AudioOutput>,
    notifier: Arc<dyn Notifier>,
    registry: ResourceRegistry,
    state: EngineState,
    session: Option<PlaybackSession>,
    surfaces: SurfaceState,
    rates: RateCycle,
    volume: Volume,
    load_token: u64,
    resume_on_bind: bool,
    start_pending: bool,
    pending_advance: Option<u64>,
    advance_resumes: bool,
}

impl PlayerEngine {
    pub fn new(
        config: EngineConfig,
        output: Box<dyn AudioOutput>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_registry(config, output, notifier, ResourceRegistry::new())
    }

    /// Creates an engine that accounts its handles in `registry`
    pub fn with_registry(
        config: EngineConfig,
        output: Box<dyn AudioOutput>,
        notifier: Arc<dyn Notifier>,
        registry: ResourceRegistry,
    ) -> Self {
        let rates = config.rates.clone();
        let volume = config.initial_volume;
        Self {
            config,
            output,
            notifier,
            registry,
            state: EngineState::Idle,
            session: None,
            surfaces: SurfaceState::default(),
            rates,
            volume,
            load_token: 0,
            resume_on_bind: false,
            start_pending: false,
            pending_advance: None,
            advance_resumes: false,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn surfaces(&self) -> SurfaceState {
        self.surfaces
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Token of the most recent load
    pub fn load_token(&self) -> u64 {
        self.load_token
    }

    /// True while a requested start awaits device confirmation
    pub fn is_start_pending(&self) -> bool {
        self.start_pending
    }

    /// Current display projection
    pub fn view(&self) -> PlayerView {
        project(self.state, self.session.as_ref(), self.surfaces)
    }

    /// Opens `book` on chapter 1, replacing any open book
    pub fn open(&mut self, book: BookMetadata) -> EngineResult<ChapterRequest> {
        if let Err(reasons) = book.validate() {
            log::warn!("Refusing to open '{}': {}", book.id, reasons.join("; "));
            return Err(EngineError::InvalidBook(reasons.join("; ")));
        }

        log::info!("Opening '{}' ({} chapters)", book.title, book.total_chapters);

        self.teardown_session();
        self.state = EngineState::Idle;
        let session = PlaybackSession::new(book, self.rates.clone(), self.volume)?;
        self.output.set_volume(session.volume());
        self.output.set_rate(session.rate());
        self.session = Some(session);

        self.surfaces = SurfaceState {
            mini_visible: true,
            full_open: true,
            chapter_list_open: false,
        };

        self.begin_load(1, false)
    }

    /// Loads chapter `n` without resuming playback afterwards
    pub fn load_chapter(&mut self, chapter: u32) -> EngineResult<ChapterRequest> {
        self.check_chapter(chapter)?;
        self.begin_load(chapter, false)
    }

    /// Jumps to chapter `n`, resuming afterwards if audio was playing
    pub fn select_chapter(&mut self, chapter: u32) -> EngineResult<ChapterRequest> {
        self.check_chapter(chapter)?;
        let resume = self.wants_playback();
        self.begin_load(chapter, resume)
    }

    pub fn next_chapter(&mut self) -> EngineResult<ChapterRequest> {
        let target = self.active_session()?.chapters().next();
        match target {
            Ok(chapter) => {
                let resume = self.wants_playback();
                self.begin_load(chapter, resume)
            }
            Err(boundary) => Err(self.report(EngineError::NavigationOutOfBounds(boundary))),
        }
    }

    pub fn previous_chapter(&mut self) -> EngineResult<ChapterRequest> {
        let target = self.active_session()?.chapters().previous();
        match target {
            Ok(chapter) => {
                let resume = self.wants_playback();
                self.begin_load(chapter, resume)
            }
            Err(boundary) => Err(self.report(EngineError::NavigationOutOfBounds(boundary))),
        }
    }

    /// Applies the outcome of a fetch. Returns false when the response was
    /// stale and has been discarded.
    pub fn complete_load(&mut self, token: u64, result: NetworkResult<Bytes>) -> bool {
        if self.state != EngineState::Loading || token != self.load_token {
            log::debug!(
                "Discarding stale chapter response (token {}, current {})",
                token,
                self.load_token
            );
            return false;
        }

        let resume = std::mem::take(&mut self.resume_on_bind);
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let chapter = session.current_chapter();

        // The previous handle goes before the new one exists
        if let Some(old) = session.replace_handle(None) {
            self.registry.release(old);
        }
        self.state = EngineState::Ready;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Chapter {} failed to load: {}", chapter, e);
                self.output.unbind();
                self.report(EngineError::ChapterUnavailable {
                    chapter,
                    reason: e.to_string(),
                });
                return true;
            }
        };

        let handle = self.registry.create(bytes);
        if let Err(e) = self.output.bind(&handle) {
            log::error!("Could not bind chapter {}: {}", chapter, e);
            self.registry.release(handle);
            self.output.unbind();
            self.report(e);
            return true;
        }

        log::info!("Chapter {} bound as {} ({} bytes)", chapter, handle.id(), handle.len());
        session.replace_handle(Some(handle));
        self.notifier.notify(&format!("Chapter {} loaded", chapter));

        if resume {
            self.request_start();
        }
        true
    }

    pub fn toggle_play_pause(&mut self) -> EngineResult<()> {
        // Idle with no book behaves like a book with nothing bound
        let has_handle = match self.active_session() {
            Ok(session) => session.has_handle(),
            Err(EngineError::NoBook) => false,
            Err(e) => return Err(e),
        };
        if !has_handle {
            return Err(self.report(EngineError::NoActiveResource));
        }

        match self.state {
            EngineState::Playing => {
                self.output.pause();
                self.set_paused();
                log::debug!("Paused");
            }
            EngineState::Loading => {
                self.resume_on_bind = !self.resume_on_bind;
                log::debug!("Resume after load: {}", self.resume_on_bind);
            }
            _ if self.start_pending => {
                self.output.pause();
                self.start_pending = false;
                log::debug!("Cancelled pending start");
            }
            _ => self.request_start(),
        }
        Ok(())
    }

    /// Seeks to `fraction` of the chapter. Ignored while the duration is unknown.
    pub fn seek(&mut self, fraction: f64) -> EngineResult<()> {
        let session = self.active_session_mut()?;
        let duration = match session.duration() {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => {
                log::debug!("Seek ignored: duration unknown");
                return Ok(());
            }
        };
        if !fraction.is_finite() {
            return Ok(());
        }

        let position = fraction.clamp(0.0, 1.0) * duration;
        session.set_position(position);
        self.output.seek(position);
        Ok(())
    }

    /// Seeks `delta` seconds from the current position, within the chapter
    pub fn seek_by(&mut self, delta: f64) -> EngineResult<()> {
        let session = self.active_session()?;
        match session.duration() {
            Some(d) if d.is_finite() && d > 0.0 => {
                let fraction = (session.position() + delta) / d;
                self.seek(fraction)
            }
            _ => Ok(()),
        }
    }

    pub fn set_volume(&mut self, fraction: f32) -> EngineResult<()> {
        let volume = Volume::new(fraction).map_err(|_| EngineError::InvalidVolume(fraction))?;
        self.active_session_mut()?.set_volume(volume);
        self.volume = volume;
        self.output.set_volume(volume);
        Ok(())
    }

    /// Steps to the next playback rate, wrapping after the last
    pub fn cycle_playback_rate(&mut self) -> EngineResult<PlaybackRate> {
        let session = self.active_session_mut()?;
        let rate = session.rates_mut().advance();
        self.rates = session.rates().clone();
        self.output.set_rate(rate);
        log::debug!("Playback rate {}", rate);
        Ok(rate)
    }

    /// Applies a device report. Returns a timer to arm when the chapter ended
    /// and the next one should follow.
    pub fn handle_device_event(&mut self, event: DeviceEvent) -> Option<AdvanceTimer> {
        let Some(session) = self.session.as_mut() else {
            return None;
        };
        if self.state == EngineState::Closed
            || session.active_handle().map(|h| h.id()) != Some(event.handle)
        {
            log::debug!("Ignoring device event for {}", event.handle);
            return None;
        }

        match event.kind {
            DeviceEventKind::MetadataLoaded { duration } => {
                log::info!("Audio loaded, duration {:.1}s", duration);
                session.set_duration(duration);
            }
            DeviceEventKind::TimeUpdate { position } => session.set_position(position),
            DeviceEventKind::Started => {
                if self.start_pending {
                    self.start_pending = false;
                    self.state = EngineState::Playing;
                    session.set_play_state(PlaybackStatus::Playing);
                    log::debug!("Playing chapter {}", session.current_chapter());
                } else {
                    // Start was cancelled while the device was getting ready
                    self.output.pause();
                }
            }
            DeviceEventKind::Rejected(reason) => {
                if std::mem::take(&mut self.start_pending) {
                    self.set_paused();
                    self.report(EngineError::PlaybackRejected(reason));
                }
            }
            DeviceEventKind::Ended => return self.chapter_ended(),
            DeviceEventKind::Failed(reason) => {
                self.start_pending = false;
                self.set_paused();
                self.report(EngineError::DecodeError(reason));
            }
        }
        None
    }

    /// Fires a previously returned [`AdvanceTimer`]
    pub fn advance_timer_fired(&mut self, token: u64) -> Option<ChapterRequest> {
        if self.pending_advance != Some(token) {
            log::debug!("Ignoring stale advance timer {}", token);
            return None;
        }
        self.pending_advance = None;

        if self.state != EngineState::Ready || token != self.load_token {
            return None;
        }

        let next = self.session.as_ref()?.chapters().next().ok()?;
        log::info!("Auto-advancing to chapter {}", next);
        let resume = self.advance_resumes;
        self.begin_load(next, resume).ok()
    }

    pub fn toggle_full_player(&mut self) -> EngineResult<()> {
        self.active_session()?;
        self.surfaces.full_open = !self.surfaces.full_open;
        Ok(())
    }

    pub fn open_full_player(&mut self) -> EngineResult<()> {
        self.active_session()?;
        self.surfaces.full_open = true;
        Ok(())
    }

    pub fn close_full_player(&mut self) -> EngineResult<()> {
        self.active_session()?;
        self.surfaces.full_open = false;
        Ok(())
    }

    pub fn toggle_chapter_list(&mut self) -> EngineResult<()> {
        self.active_session()?;
        self.surfaces.chapter_list_open = !self.surfaces.chapter_list_open;
        Ok(())
    }

    /// Releases everything and hides the player. Only `open` works afterwards.
    pub fn close(&mut self) {
        if self.state == EngineState::Closed {
            return;
        }
        self.teardown_session();
        self.surfaces = SurfaceState::default();
        self.state = EngineState::Closed;
        log::info!("Player closed");
    }

    fn chapter_ended(&mut self) -> Option<AdvanceTimer> {
        if self.pending_advance.is_some() {
            log::debug!("Duplicate end of stream ignored");
            return None;
        }
        // The outgoing chapter finishing while its replacement loads
        if self.state == EngineState::Loading {
            return None;
        }

        let was_playing = self.state == EngineState::Playing || self.start_pending;
        self.start_pending = false;
        self.set_paused();

        let session = self.session.as_mut()?;
        if let Some(duration) = session.duration() {
            session.set_position(duration);
        }

        if session.chapters().is_last() {
            log::info!("Reached the end of '{}'", session.book().title);
            return None;
        }
        if !self.config.auto_advance {
            return None;
        }

        self.pending_advance = Some(self.load_token);
        self.advance_resumes = was_playing;
        Some(AdvanceTimer {
            token: self.load_token,
            delay: self.config.auto_advance_delay,
        })
    }

    fn begin_load(&mut self, chapter: u32, resume: bool) -> EngineResult<ChapterRequest> {
        if self.state == EngineState::Playing || self.start_pending {
            self.output.pause();
        }
        self.start_pending = false;
        self.pending_advance = None;
        self.resume_on_bind = resume;

        let session = self.active_session_mut()?;
        session.chapters_mut().go_to(chapter)?;
        if session.play_state() == PlaybackStatus::Playing {
            session.set_play_state(PlaybackStatus::Paused);
        }
        let audio_slug = session.book().audio_slug.clone();

        self.load_token += 1;
        self.state = EngineState::Loading;
        log::debug!("Loading chapter {} (token {})", chapter, self.load_token);

        Ok(ChapterRequest {
            token: self.load_token,
            audio_slug,
            chapter,
        })
    }

    fn request_start(&mut self) {
        match self.output.play() {
            Ok(()) => self.start_pending = true,
            Err(e) => {
                self.start_pending = false;
                self.set_paused();
                self.report(EngineError::PlaybackRejected(e.to_string()));
            }
        }
    }

    fn set_paused(&mut self) {
        if self.state == EngineState::Playing {
            self.state = EngineState::Ready;
        }
        if let Some(session) = self.session.as_mut() {
            if session.play_state() == PlaybackStatus::Playing {
                session.set_play_state(PlaybackStatus::Paused);
            }
        }
    }

    /// True when audio is playing, about to start, or queued to resume
    fn wants_playback(&self) -> bool {
        self.state == EngineState::Playing
            || self.start_pending
            || (self.state == EngineState::Loading && self.resume_on_bind)
    }

    fn check_chapter(&self, chapter: u32) -> EngineResult<()> {
        let cursor = self.active_session()?.chapters();
        if cursor.contains(chapter) {
            Ok(())
        } else {
            log::warn!("Chapter {} requested, book has {}", chapter, cursor.total());
            Err(EngineError::InvalidChapter {
                chapter,
                total: cursor.total(),
            })
        }
    }

    fn active_session(&self) -> EngineResult<&PlaybackSession> {
        if self.state == EngineState::Closed {
            return Err(EngineError::Closed);
        }
        self.session.as_ref().ok_or(EngineError::NoBook)
    }

    fn active_session_mut(&mut self) -> EngineResult<&mut PlaybackSession> {
        if self.state == EngineState::Closed {
            return Err(EngineError::Closed);
        }
        self.session.as_mut().ok_or(EngineError::NoBook)
    }

    /// Surfaces an error to the listener and hands it back
    fn report(&self, error: EngineError) -> EngineError {
        if let Some(message) = error.notification() {
            self.notifier.notify(&message);
        }
        error
    }

    fn teardown_session(&mut self) {
        if self.state == EngineState::Playing || self.start_pending {
            self.output.pause();
        }
        self.output.unbind();

        if let Some(mut session) = self.session.take() {
            if let Some(handle) = session.replace_handle(None) {
                self.registry.release(handle);
            }
        }

        self.load_token += 1;
        self.resume_on_bind = false;
        self.start_pending = false;
        self.pending_advance = None;
    }
}

impl Drop for PlayerEngine {
    fn drop(&mut self) {
        if self.session.is_some() {
            self.teardown_session();
        }
    }
}
