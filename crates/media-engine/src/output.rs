// crates/media-engine/src/output.rs
//! Playback device seam
//!
//! The engine drives an [`AudioOutput`] with plain method calls. Anything the
//! device learns later (duration, position, start confirmation, end of
//! stream) comes back as a [`DeviceEvent`] through the attached sink, tagged
//! with the handle it concerns so events from a replaced source are ignored.

use crate::error::EngineResult;
use crate::resource::{AudioHandle, HandleId};
use dreamfm_core::{PlaybackRate, Volume};
use std::sync::Arc;

/// Something the device reports asynchronously
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEventKind {
    /// Source probed; duration in seconds
    MetadataLoaded { duration: f64 },
    /// Current position in seconds
    TimeUpdate { position: f64 },
    /// A requested start actually began producing audio
    Started,
    /// A requested start was refused
    Rejected(String),
    /// The source played through to its end
    Ended,
    /// The source could not be decoded or the device failed mid-stream
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    pub handle: HandleId,
    pub kind: DeviceEventKind,
}

impl DeviceEvent {
    pub fn new(handle: HandleId, kind: DeviceEventKind) -> Self {
        Self { handle, kind }
    }
}

/// Where a device delivers its events
#[derive(Clone)]
pub struct DeviceEventSink(Arc<dyn Fn(DeviceEvent) + Send + Sync>);

impl DeviceEventSink {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(DeviceEvent) + Send + Sync + 'static,
    {
        Self(Arc::new(deliver))
    }

    /// A sink that drops everything, used until a real one is attached
    pub fn discard() -> Self {
        Self::new(|_| {})
    }

    pub fn emit(&self, event: DeviceEvent) {
        (self.0)(event)
    }
}

impl std::fmt::Debug for DeviceEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DeviceEventSink")
    }
}

/// A playback device bound to at most one source at a time
pub trait AudioOutput: Send {
    /// Routes future events to `sink`
    fn attach(&mut self, sink: DeviceEventSink);

    /// Replaces the current source with `handle`'s audio. The device reports
    /// `MetadataLoaded` (or `Failed`) for the new handle later.
    fn bind(&mut self, handle: &AudioHandle) -> EngineResult<()>;

    /// Drops the current source, if any
    fn unbind(&mut self);

    /// Requests playback. Success here only means the request was accepted;
    /// the outcome arrives as `Started` or `Rejected`.
    fn play(&mut self) -> EngineResult<()>;

    fn pause(&mut self);

    fn seek(&mut self, position_secs: f64);

    fn set_volume(&mut self, volume: Volume);

    fn set_rate(&mut self, rate: PlaybackRate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceRegistry;
    use bytes::Bytes;
    use std::sync::Mutex;

    #[test]
    fn test_sink_delivers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            DeviceEventSink::new(move |event| seen.lock().unwrap().push(event))
        };

        let handle = ResourceRegistry::new().create(Bytes::new());
        sink.emit(DeviceEvent::new(handle.id(), DeviceEventKind::Ended));
        DeviceEventSink::discard().emit(DeviceEvent::new(handle.id(), DeviceEventKind::Started));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, DeviceEventKind::Ended);
    }
}
