//! Per-handle decode thread
//!
//! Each bound handle gets its own thread that decodes the chapter payload,
//! applies rate and volume, and feeds a [`SampleWriter`]. The device is only
//! opened on the first `Play`, which is where a start can be rejected.
//! Everything the thread observes goes back out as [`DeviceEvent`]s tagged
//! with the handle it was started for.

use crate::decoder::AudioDecoder;
use crate::error::{EngineError, EngineResult};
use crate::output::{DeviceEvent, DeviceEventKind, DeviceEventSink};
use crate::resource::HandleId;
use crate::speed::SpeedProcessor;
use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use dreamfm_core::PlaybackRate;
use std::sync::Arc;
use std::thread;

/// Seconds of audio between two `TimeUpdate` reports
const TIME_UPDATE_INTERVAL: f64 = 0.25;

/// Commands sent to the playback thread
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PlaybackCommand {
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
    SetRate(PlaybackRate),
    Stop,
}

/// Destination for decoded, interleaved samples
pub(crate) trait SampleWriter {
    /// Queues a block; `false` once the destination is gone
    fn write(&mut self, samples: Vec<f32>) -> bool;
}

/// Opens a writer for `(sample_rate, channels)`
pub(crate) type OpenWriter =
    Arc<dyn Fn(u32, u16) -> EngineResult<Box<dyn SampleWriter>> + Send + Sync>;

/// Playback thread handle
///
/// Nothing here blocks the caller: commands are queued without waiting and
/// stopping does not join, so the async service never stalls on a device.
pub(crate) struct PlaybackThread {
    command_tx: Sender<PlaybackCommand>,
}

impl PlaybackThread {
    pub fn start(
        id: HandleId,
        bytes: Bytes,
        sink: DeviceEventSink,
        open: OpenWriter,
    ) -> EngineResult<Self> {
        let (command_tx, command_rx) = bounded(16);

        thread::Builder::new()
            .name(format!("dreamfm-playback-{}", id.value()))
            .spawn(move || {
                let reporter = Reporter { id, sink };
                playback_loop(bytes, command_rx, &reporter, open);
                log::debug!("Playback thread for {} finished", id);
            })
            .map_err(|e| EngineError::OutputError(format!("Failed to spawn playback thread: {}", e)))?;

        Ok(Self { command_tx })
    }

    /// Queue a command for the playback thread
    pub fn send(&self, command: PlaybackCommand) -> EngineResult<()> {
        self.command_tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(command) => {
                EngineError::OutputError(format!("Playback thread busy, dropped {:?}", command))
            }
            TrySendError::Disconnected(_) => {
                EngineError::OutputError("Playback thread gone".to_string())
            }
        })
    }

    /// Ask the thread to finish without waiting for it
    ///
    /// A thread stuck on the device notices once its write returns; dropping
    /// the sender ends it even when the `Stop` does not fit in the queue.
    /// Anything it still reports carries a handle that is no longer bound.
    pub fn stop(self) {
        if let Err(e) = self.send(PlaybackCommand::Stop) {
            log::debug!("Stop not queued: {}", e);
        }
    }
}

struct Reporter {
    id: HandleId,
    sink: DeviceEventSink,
}

impl Reporter {
    fn emit(&self, kind: DeviceEventKind) {
        self.sink.emit(DeviceEvent::new(self.id, kind));
    }
}

fn playback_loop(
    bytes: Bytes,
    command_rx: Receiver<PlaybackCommand>,
    reporter: &Reporter,
    open: OpenWriter,
) {
    let mut decoder = match AudioDecoder::from_bytes(bytes) {
        Ok(decoder) => decoder,
        Err(e) => {
            log::error!("Cannot decode chapter for {}: {}", reporter.id, e);
            reporter.emit(DeviceEventKind::Failed(e.to_string()));
            // Stay alive until told to stop so commands never hit a closed channel
            while let Ok(command) = command_rx.recv() {
                if command == PlaybackCommand::Stop {
                    break;
                }
            }
            return;
        }
    };

    if let Some(duration) = decoder.duration() {
        reporter.emit(DeviceEventKind::MetadataLoaded { duration });
    }

    let spec = *decoder.spec();
    let channels = spec.channels.count().max(1) as u16;
    let mut processor = SpeedProcessor::new(channels);
    let mut writer: Option<Box<dyn SampleWriter>> = None;

    let mut playing = false;
    let mut ended = false;
    let mut volume = 1.0_f32;
    let mut position = 0.0_f64;
    let mut last_report = 0.0_f64;

    loop {
        // Block while paused, poll while playing
        let command = if playing {
            match command_rx.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match command_rx.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            }
        };

        match command {
            Some(PlaybackCommand::Play) => {
                if writer.is_none() {
                    match open(spec.rate, channels) {
                        Ok(opened) => writer = Some(opened),
                        Err(e) => {
                            log::warn!("Playback rejected: {}", e);
                            reporter.emit(DeviceEventKind::Rejected(e.to_string()));
                            continue;
                        }
                    }
                }
                if ended {
                    ended = false;
                    position = 0.0;
                    if let Err(e) = decoder.seek(0.0) {
                        log::warn!("Cannot rewind: {}", e);
                    }
                }
                playing = true;
                reporter.emit(DeviceEventKind::Started);
            }
            Some(PlaybackCommand::Pause) => {
                playing = false;
            }
            Some(PlaybackCommand::Seek(time)) => match decoder.seek(time) {
                Ok(()) => {
                    ended = false;
                    position = time;
                    last_report = time;
                    reporter.emit(DeviceEventKind::TimeUpdate { position });
                }
                Err(e) => log::warn!("{}", e),
            },
            Some(PlaybackCommand::SetVolume(v)) => {
                volume = v.clamp(0.0, 1.0);
            }
            Some(PlaybackCommand::SetRate(rate)) => {
                processor.set_rate(rate);
            }
            Some(PlaybackCommand::Stop) => break,
            None => {}
        }

        if !playing {
            continue;
        }

        match decoder.decode_next() {
            Ok(Some(packet)) => {
                position += packet.seconds();

                let mut samples = processor.process(&packet.samples);
                for sample in &mut samples {
                    *sample *= volume;
                }

                let delivered = writer.as_mut().is_some_and(|w| w.write(samples));
                if !delivered {
                    playing = false;
                    writer = None;
                    reporter.emit(DeviceEventKind::Failed(
                        "Audio device stopped accepting samples".to_string(),
                    ));
                    continue;
                }

                if position - last_report >= TIME_UPDATE_INTERVAL {
                    last_report = position;
                    reporter.emit(DeviceEventKind::TimeUpdate { position });
                }
            }
            Ok(None) => {
                playing = false;
                ended = true;
                reporter.emit(DeviceEventKind::TimeUpdate { position });
                reporter.emit(DeviceEventKind::Ended);
                log::info!("Playback of {} finished", reporter.id);
            }
            Err(e) => {
                playing = false;
                reporter.emit(DeviceEventKind::Failed(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::wav_fixture;
    use crate::resource::ResourceRegistry;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Collect(Arc<Mutex<usize>>);

    impl SampleWriter for Collect {
        fn write(&mut self, samples: Vec<f32>) -> bool {
            *self.0.lock().unwrap() += samples.len();
            true
        }
    }

    fn recording_sink() -> (DeviceEventSink, crossbeam_channel::Receiver<DeviceEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let sink = DeviceEventSink::new(move |event| {
            let _ = tx.send(event);
        });
        (sink, rx)
    }

    fn next_kind(rx: &crossbeam_channel::Receiver<DeviceEvent>) -> DeviceEventKind {
        rx.recv_timeout(Duration::from_secs(5)).unwrap().kind
    }

    #[test]
    fn test_plays_to_end() {
        let registry = ResourceRegistry::new();
        let handle = registry.create(wav_fixture(8000, 8000));
        let written = Arc::new(Mutex::new(0));
        let open: OpenWriter = {
            let written = Arc::clone(&written);
            Arc::new(move |_, _| Ok(Box::new(Collect(Arc::clone(&written))) as Box<dyn SampleWriter>))
        };

        let (sink, rx) = recording_sink();
        let thread =
            PlaybackThread::start(handle.id(), handle.bytes().clone(), sink, open).unwrap();

        assert_eq!(next_kind(&rx), DeviceEventKind::MetadataLoaded { duration: 1.0 });
        thread.send(PlaybackCommand::Play).unwrap();
        assert_eq!(next_kind(&rx), DeviceEventKind::Started);

        let events: Vec<DeviceEvent> = rx.iter().take_while(|e| e.kind != DeviceEventKind::Ended).collect();
        assert!(events.iter().all(|e| e.handle == handle.id()));
        assert!(events
            .iter()
            .any(|e| matches!(e.kind, DeviceEventKind::TimeUpdate { position } if (position - 1.0).abs() < 1e-6)));

        thread.stop();
        assert_eq!(*written.lock().unwrap(), 8000);
    }

    struct Stalled(crossbeam_channel::Receiver<()>);

    impl SampleWriter for Stalled {
        fn write(&mut self, _samples: Vec<f32>) -> bool {
            let _ = self.0.recv();
            false
        }
    }

    #[test]
    fn test_stop_does_not_wait_for_stalled_device() {
        let handle = ResourceRegistry::new().create(wav_fixture(8000, 8000));
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
        let open: OpenWriter = Arc::new(move |_, _| {
            Ok(Box::new(Stalled(release_rx.clone())) as Box<dyn SampleWriter>)
        });

        let (sink, rx) = recording_sink();
        let thread = PlaybackThread::start(handle.id(), handle.bytes().clone(), sink, open).unwrap();
        assert!(matches!(next_kind(&rx), DeviceEventKind::MetadataLoaded { .. }));
        thread.send(PlaybackCommand::Play).unwrap();
        assert_eq!(next_kind(&rx), DeviceEventKind::Started);

        let stopping = std::time::Instant::now();
        thread.stop();
        assert!(stopping.elapsed() < Duration::from_millis(500));

        // Unblocks the write; the thread then exits and drops its sink
        drop(release_tx);
        assert!(matches!(next_kind(&rx), DeviceEventKind::Failed(_)));
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_rejected_when_device_unavailable() {
        let handle = ResourceRegistry::new().create(wav_fixture(8000, 800));
        let open: OpenWriter =
            Arc::new(|_, _| Err(EngineError::OutputError("no device".to_string())));

        let (sink, rx) = recording_sink();
        let thread = PlaybackThread::start(handle.id(), handle.bytes().clone(), sink, open).unwrap();

        assert!(matches!(next_kind(&rx), DeviceEventKind::MetadataLoaded { .. }));
        thread.send(PlaybackCommand::Play).unwrap();
        assert!(matches!(next_kind(&rx), DeviceEventKind::Rejected(_)));
    }

    #[test]
    fn test_undecodable_payload_fails() {
        let handle = ResourceRegistry::new().create(Bytes::from_static(b"not audio at all"));
        let open: OpenWriter = Arc::new(|_, _| Err(EngineError::OutputError("unused".to_string())));

        let (sink, rx) = recording_sink();
        let thread = PlaybackThread::start(handle.id(), handle.bytes().clone(), sink, open).unwrap();

        assert!(matches!(next_kind(&rx), DeviceEventKind::Failed(_)));
        assert!(thread.send(PlaybackCommand::Play).is_ok());
    }
}
