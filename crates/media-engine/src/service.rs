//! Async front of the player engine
//!
//! One task owns the [`PlayerEngine`] and handles one event at a time: user
//! commands from [`PlayerHandle`]s, finished fetches, device reports and
//! auto-advance timers. After each event it publishes a fresh [`PlayerView`].
//! Fetches run as separate tasks; a superseded fetch is aborted, and the
//! engine's load tokens discard any result that still slips through.

use crate::engine::{AdvanceTimer, ChapterRequest, EngineConfig, PlayerEngine};
use crate::error::{EngineError, EngineResult};
use crate::notify::Notifier;
use crate::output::{AudioOutput, DeviceEvent, DeviceEventSink};
use crate::projection::PlayerView;
use crate::resource::ResourceRegistry;
use crate::state::EngineState;
use bytes::Bytes;
use dreamfm_core::BookMetadata;
use dreamfm_network::{ChapterSource, NetworkError, NetworkResult};
use dreamfm_resilience::with_timeout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// User-level operations accepted by the player
#[derive(Debug)]
pub enum PlayerCommand {
    Open(BookMetadata),
    LoadChapter(u32),
    SelectChapter(u32),
    NextChapter,
    PreviousChapter,
    TogglePlayPause,
    Seek(f64),
    SeekBy(f64),
    SetVolume(f32),
    CyclePlaybackRate,
    ToggleFullPlayer,
    OpenFullPlayer,
    CloseFullPlayer,
    ToggleChapterList,
    Close,
    /// Answered once every earlier command has been handled
    Sync(oneshot::Sender<()>),
}

/// Completions produced inside the service
enum InternalEvent {
    Fetched {
        token: u64,
        result: NetworkResult<Bytes>,
    },
    Device(DeviceEvent),
    AdvanceDue(u64),
}

/// Service settings beyond the engine's own
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub engine: EngineConfig,
    /// Upper bound for one chapter fetch; `None` leaves it to the source
    pub fetch_timeout: Option<Duration>,
}

pub struct PlayerService {
    engine: PlayerEngine,
    source: Arc<dyn ChapterSource>,
    fetch_timeout: Option<Duration>,
    commands: mpsc::UnboundedReceiver<PlayerCommand>,
    internal_tx: mpsc::UnboundedSender<InternalEvent>,
    internal_rx: mpsc::UnboundedReceiver<InternalEvent>,
    view_tx: watch::Sender<PlayerView>,
    fetch: Option<JoinHandle<()>>,
    advance: Option<JoinHandle<()>>,
}

impl PlayerService {
    /// Builds the service and the first handle to it. Nothing runs until
    /// [`PlayerService::run`] is polled.
    pub fn new(
        config: ServiceConfig,
        mut output: Box<dyn AudioOutput>,
        notifier: Arc<dyn Notifier>,
        source: Arc<dyn ChapterSource>,
    ) -> (Self, PlayerHandle) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        let device_tx = internal_tx.clone();
        output.attach(DeviceEventSink::new(move |event| {
            // The service may already be gone during teardown
            let _ = device_tx.send(InternalEvent::Device(event));
        }));

        let registry = ResourceRegistry::new();
        let engine =
            PlayerEngine::with_registry(config.engine, output, notifier, registry.clone());
        let (view_tx, view_rx) = watch::channel(engine.view());

        let service = Self {
            engine,
            source,
            fetch_timeout: config.fetch_timeout,
            commands,
            internal_tx,
            internal_rx,
            view_tx,
            fetch: None,
            advance: None,
        };
        let handle = PlayerHandle {
            commands: command_tx,
            view: view_rx,
            registry,
        };
        (service, handle)
    }

    /// Builds the service and runs it on the current tokio runtime
    pub fn spawn(
        config: ServiceConfig,
        output: Box<dyn AudioOutput>,
        notifier: Arc<dyn Notifier>,
        source: Arc<dyn ChapterSource>,
    ) -> (PlayerHandle, JoinHandle<()>) {
        let (service, handle) = Self::new(config, output, notifier, source);
        let task = tokio::spawn(service.run());
        (handle, task)
    }

    /// Handles events until every [`PlayerHandle`] has been dropped
    pub async fn run(mut self) {
        log::debug!("Player service started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.internal_rx.recv() => self.handle_internal(event),
            }
            self.publish();
        }

        self.cancel_tasks();
        self.engine.close();
        self.publish();
        log::debug!("Player service stopped");
    }

    fn handle_command(&mut self, command: PlayerCommand) {
        log::debug!("Command {:?}", command);

        let outcome = match command {
            PlayerCommand::Open(book) => self.engine.open(book).map(Some),
            PlayerCommand::LoadChapter(n) => self.engine.load_chapter(n).map(Some),
            PlayerCommand::SelectChapter(n) => self.engine.select_chapter(n).map(Some),
            PlayerCommand::NextChapter => self.engine.next_chapter().map(Some),
            PlayerCommand::PreviousChapter => self.engine.previous_chapter().map(Some),
            PlayerCommand::TogglePlayPause => self.engine.toggle_play_pause().map(|_| None),
            PlayerCommand::Seek(fraction) => self.engine.seek(fraction).map(|_| None),
            PlayerCommand::SeekBy(delta) => self.engine.seek_by(delta).map(|_| None),
            PlayerCommand::SetVolume(volume) => self.engine.set_volume(volume).map(|_| None),
            PlayerCommand::CyclePlaybackRate => {
                self.engine.cycle_playback_rate().map(|_| None)
            }
            PlayerCommand::ToggleFullPlayer => self.engine.toggle_full_player().map(|_| None),
            PlayerCommand::OpenFullPlayer => self.engine.open_full_player().map(|_| None),
            PlayerCommand::CloseFullPlayer => self.engine.close_full_player().map(|_| None),
            PlayerCommand::ToggleChapterList => {
                self.engine.toggle_chapter_list().map(|_| None)
            }
            PlayerCommand::Close => {
                self.cancel_tasks();
                self.engine.close();
                Ok(None)
            }
            PlayerCommand::Sync(reply) => {
                let _ = reply.send(());
                Ok(None)
            }
        };

        match outcome {
            Ok(Some(request)) => self.start_fetch(request),
            Ok(None) => {}
            Err(e) => log::debug!("Command not applied: {}", e),
        }
    }

    fn handle_internal(&mut self, event: InternalEvent) {
        match event {
            InternalEvent::Fetched { token, result } => {
                if self.engine.complete_load(token, result) {
                    self.fetch = None;
                }
            }
            InternalEvent::Device(event) => {
                if let Some(timer) = self.engine.handle_device_event(event) {
                    self.arm_advance(timer);
                }
            }
            InternalEvent::AdvanceDue(token) => {
                self.advance = None;
                if let Some(request) = self.engine.advance_timer_fired(token) {
                    self.start_fetch(request);
                }
            }
        }
    }

    fn start_fetch(&mut self, request: ChapterRequest) {
        if let Some(previous) = self.fetch.take() {
            log::debug!("Aborting superseded fetch");
            previous.abort();
        }
        if let Some(timer) = self.advance.take() {
            timer.abort();
        }

        log::info!(
            "Fetching chapter {} from {}",
            request.chapter,
            self.source.chapter_url(&request.audio_slug, request.chapter)
        );

        let fetch = self.source.fetch_chapter(&request.audio_slug, request.chapter);
        let timeout = self.fetch_timeout;
        let tx = self.internal_tx.clone();
        let token = request.token;

        self.fetch = Some(tokio::spawn(async move {
            let result = match timeout {
                Some(limit) => match with_timeout(limit, fetch).await {
                    Ok(result) => result,
                    Err(elapsed) => Err(NetworkError::from(elapsed)),
                },
                None => fetch.await,
            };
            let _ = tx.send(InternalEvent::Fetched { token, result });
        }));
    }

    fn arm_advance(&mut self, timer: AdvanceTimer) {
        log::debug!("Next chapter in {:?}", timer.delay);
        let tx = self.internal_tx.clone();

        if let Some(previous) = self.advance.replace(tokio::spawn(async move {
            tokio::time::sleep(timer.delay).await;
            let _ = tx.send(InternalEvent::AdvanceDue(timer.token));
        })) {
            previous.abort();
        }
    }

    fn cancel_tasks(&mut self) {
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
        if let Some(timer) = self.advance.take() {
            timer.abort();
        }
    }

    fn publish(&self) {
        let view = self.engine.view();
        self.view_tx.send_if_modified(|current| {
            if *current != view {
                *current = view;
                true
            } else {
                false
            }
        });
    }
}

/// Cloneable front door to a running [`PlayerService`]
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<PlayerCommand>,
    view: watch::Receiver<PlayerView>,
    registry: ResourceRegistry,
}

impl PlayerHandle {
    /// Queues a command; fails only when the service has stopped
    pub fn send(&self, command: PlayerCommand) -> EngineResult<()> {
        self.commands.send(command).map_err(|_| EngineError::Closed)
    }

    pub fn open(&self, book: BookMetadata) -> EngineResult<()> {
        self.send(PlayerCommand::Open(book))
    }

    pub fn load_chapter(&self, chapter: u32) -> EngineResult<()> {
        self.send(PlayerCommand::LoadChapter(chapter))
    }

    pub fn select_chapter(&self, chapter: u32) -> EngineResult<()> {
        self.send(PlayerCommand::SelectChapter(chapter))
    }

    pub fn next_chapter(&self) -> EngineResult<()> {
        self.send(PlayerCommand::NextChapter)
    }

    pub fn previous_chapter(&self) -> EngineResult<()> {
        self.send(PlayerCommand::PreviousChapter)
    }

    pub fn toggle_play_pause(&self) -> EngineResult<()> {
        self.send(PlayerCommand::TogglePlayPause)
    }

    pub fn seek(&self, fraction: f64) -> EngineResult<()> {
        self.send(PlayerCommand::Seek(fraction))
    }

    pub fn seek_by(&self, delta_secs: f64) -> EngineResult<()> {
        self.send(PlayerCommand::SeekBy(delta_secs))
    }

    pub fn set_volume(&self, fraction: f32) -> EngineResult<()> {
        self.send(PlayerCommand::SetVolume(fraction))
    }

    pub fn cycle_playback_rate(&self) -> EngineResult<()> {
        self.send(PlayerCommand::CyclePlaybackRate)
    }

    pub fn toggle_full_player(&self) -> EngineResult<()> {
        self.send(PlayerCommand::ToggleFullPlayer)
    }

    pub fn open_full_player(&self) -> EngineResult<()> {
        self.send(PlayerCommand::OpenFullPlayer)
    }

    pub fn close_full_player(&self) -> EngineResult<()> {
        self.send(PlayerCommand::CloseFullPlayer)
    }

    pub fn toggle_chapter_list(&self) -> EngineResult<()> {
        self.send(PlayerCommand::ToggleChapterList)
    }

    pub fn close(&self) -> EngineResult<()> {
        self.send(PlayerCommand::Close)
    }

    /// Waits until every command sent before this call has been handled
    pub async fn sync(&self) -> EngineResult<()> {
        let (tx, rx) = oneshot::channel();
        self.send(PlayerCommand::Sync(tx))?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Latest published view
    pub fn view(&self) -> PlayerView {
        self.view.borrow().clone()
    }

    /// A receiver notified on every view change
    pub fn subscribe(&self) -> watch::Receiver<PlayerView> {
        self.view.clone()
    }

    /// Waits until the published view satisfies `predicate`
    pub async fn wait_for<F>(&self, predicate: F) -> EngineResult<PlayerView>
    where
        F: FnMut(&PlayerView) -> bool,
    {
        let mut view = self.view.clone();
        let matched = view.wait_for(predicate).await.map_err(|_| EngineError::Closed)?;
        Ok(matched.clone())
    }

    /// Waits until the engine reaches `state`
    pub async fn wait_for_state(&self, state: EngineState) -> EngineResult<PlayerView> {
        self.wait_for(|view| view.state == state).await
    }

    /// Handle accounting shared with the engine
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }
}
