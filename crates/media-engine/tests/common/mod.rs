//! Test doubles shared by the integration tests

#![allow(dead_code)]

use bytes::Bytes;
use dreamfm_core::{BookMetadata, PlaybackRate, Volume};
use dreamfm_media_engine::{
    AudioHandle, AudioOutput, DeviceEvent, DeviceEventKind, DeviceEventSink, EngineResult,
    HandleId, Notifier,
};
use dreamfm_network::{chapter_url, ChapterSource, NetworkError, NetworkResult};
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

pub const BASE_URL: &str = "http://audio.test";

pub fn book(total: u32) -> BookMetadata {
    BookMetadata::new("book-1", "The Long Road", "abc", total).with_author("A. Writer")
}

/// Fails the test instead of hanging when `fut` never finishes
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(60), fut)
        .await
        .expect("timed out")
}

#[derive(Default)]
struct DeviceState {
    sink: Option<DeviceEventSink>,
    bound: Option<HandleId>,
    calls: Vec<String>,
    duration: Option<f64>,
    reject_play: bool,
}

/// Scriptable stand-in for a playback device
///
/// Reports metadata on bind and confirms or rejects every play request
/// immediately; the test emits everything else.
#[derive(Clone, Default)]
pub struct FakeDevice(Arc<Mutex<DeviceState>>);

impl FakeDevice {
    pub fn new() -> Self {
        let device = Self::default();
        device.0.lock().unwrap().duration = Some(120.0);
        device
    }

    pub fn output(&self) -> Box<dyn AudioOutput> {
        Box::new(FakeOutput(self.clone()))
    }

    pub fn bound(&self) -> Option<HandleId> {
        self.0.lock().unwrap().bound
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn set_reject_play(&self, reject: bool) {
        self.0.lock().unwrap().reject_play = reject;
    }

    /// Emits `kind` for the currently bound handle
    pub fn emit(&self, kind: DeviceEventKind) {
        let id = self.bound().expect("nothing bound");
        self.emit_for(id, kind);
    }

    pub fn emit_for(&self, id: HandleId, kind: DeviceEventKind) {
        let sink = self.0.lock().unwrap().sink.clone();
        if let Some(sink) = sink {
            sink.emit(DeviceEvent::new(id, kind));
        }
    }

    fn record(&self, call: String) {
        self.0.lock().unwrap().calls.push(call);
    }
}

struct FakeOutput(FakeDevice);

impl AudioOutput for FakeOutput {
    fn attach(&mut self, sink: DeviceEventSink) {
        self.0 .0.lock().unwrap().sink = Some(sink);
    }

    fn bind(&mut self, handle: &AudioHandle) -> EngineResult<()> {
        let duration = {
            let mut state = self.0 .0.lock().unwrap();
            state.bound = Some(handle.id());
            state.calls.push(format!("bind {}", handle.id().value()));
            state.duration
        };
        if let Some(duration) = duration {
            self.0
                .emit_for(handle.id(), DeviceEventKind::MetadataLoaded { duration });
        }
        Ok(())
    }

    fn unbind(&mut self) {
        let mut state = self.0 .0.lock().unwrap();
        state.bound = None;
        state.calls.push("unbind".to_string());
    }

    fn play(&mut self) -> EngineResult<()> {
        self.0.record("play".to_string());
        let (reject, bound) = {
            let state = self.0 .0.lock().unwrap();
            (state.reject_play, state.bound)
        };
        if let Some(id) = bound {
            let kind = if reject {
                DeviceEventKind::Rejected("autoplay blocked".to_string())
            } else {
                DeviceEventKind::Started
            };
            self.0.emit_for(id, kind);
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.0.record("pause".to_string());
    }

    fn seek(&mut self, position_secs: f64) {
        self.0.record(format!("seek {}", position_secs));
    }

    fn set_volume(&mut self, volume: Volume) {
        self.0.record(format!("volume {}", volume.as_percent()));
    }

    fn set_rate(&mut self, rate: PlaybackRate) {
        self.0.record(format!("rate {}", rate));
    }
}

/// Chapter source that answers from memory
///
/// Immediate sources answer at once. Gated sources hold every request until
/// the test resolves it, so completion order is under test control.
pub struct FakeSource {
    gated: bool,
    requests: Mutex<Vec<String>>,
    missing: Mutex<HashSet<u32>>,
    pending: Mutex<Vec<(u32, oneshot::Sender<NetworkResult<Bytes>>)>>,
}

impl FakeSource {
    pub fn immediate() -> Arc<Self> {
        Arc::new(Self::with_gate(false))
    }

    pub fn gated() -> Arc<Self> {
        Arc::new(Self::with_gate(true))
    }

    fn with_gate(gated: bool) -> Self {
        Self {
            gated,
            requests: Mutex::new(Vec::new()),
            missing: Mutex::new(HashSet::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn set_missing(&self, chapter: u32) {
        self.missing.lock().unwrap().insert(chapter);
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Completes the oldest held request for `chapter`. Returns false when
    /// nobody is waiting for it any more.
    pub fn resolve(&self, chapter: u32) -> bool {
        let mut pending = self.pending.lock().unwrap();
        let Some(index) = pending.iter().position(|(n, _)| *n == chapter) else {
            return false;
        };
        let (_, tx) = pending.remove(index);
        tx.send(Ok(payload(chapter))).is_ok()
    }

    /// True once the request for `chapter` has been dropped by its caller
    pub fn is_abandoned(&self, chapter: u32) -> bool {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| *n == chapter)
            .all(|(_, tx)| tx.is_closed())
    }
}

fn payload(chapter: u32) -> Bytes {
    Bytes::from(format!("chapter {} audio", chapter))
}

impl ChapterSource for FakeSource {
    fn chapter_url(&self, audio_slug: &str, chapter: u32) -> String {
        chapter_url(BASE_URL, audio_slug, chapter)
    }

    fn fetch_chapter(
        &self,
        audio_slug: &str,
        chapter: u32,
    ) -> BoxFuture<'static, NetworkResult<Bytes>> {
        let url = self.chapter_url(audio_slug, chapter);
        self.requests.lock().unwrap().push(url.clone());

        if self.missing.lock().unwrap().contains(&chapter) {
            return future::ready(Err(NetworkError::Status { url, status: 404 })).boxed();
        }
        if !self.gated {
            return future::ready(Ok(payload(chapter))).boxed();
        }

        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push((chapter, tx));
        async move { rx.await.unwrap_or(Err(NetworkError::Timeout)) }.boxed()
    }
}

/// Notifier that keeps every message
#[derive(Default)]
pub struct Messages(Mutex<Vec<String>>);

impl Messages {
    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.0.lock().unwrap().last().cloned()
    }
}

impl Notifier for Messages {
    fn notify(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}
