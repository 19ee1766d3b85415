//! Audio output on the system's default device
//!
//! [`SpeakerOutput`] runs one playback thread per bound handle. The cpal
//! stream is built inside that thread on the first play request and lives
//! as long as the thread does.

use crate::error::{EngineError, EngineResult};
use crate::output::{AudioOutput, DeviceEventSink};
use crate::playback_thread::{OpenWriter, PlaybackCommand, PlaybackThread, SampleWriter};
use crate::resource::AudioHandle;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use crossbeam_channel::{bounded, SendTimeoutError, Sender, TryRecvError};
use dreamfm_core::{PlaybackRate, Volume};
use std::sync::Arc;
use std::time::Duration;

/// Blocks queued ahead of the device
const QUEUE_DEPTH: usize = 4;

/// How long a block may wait for the device before it counts as gone
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// [`AudioOutput`] backed by the default cpal device
pub struct SpeakerOutput {
    sink: DeviceEventSink,
    open: OpenWriter,
    current: Option<PlaybackThread>,
    volume: Volume,
    rate: PlaybackRate,
}

impl SpeakerOutput {
    pub fn new() -> Self {
        Self::with_opener(Arc::new(|rate, channels| {
            CpalWriter::open(rate, channels).map(|w| Box::new(w) as Box<dyn SampleWriter>)
        }))
    }

    pub(crate) fn with_opener(open: OpenWriter) -> Self {
        Self {
            sink: DeviceEventSink::discard(),
            open,
            current: None,
            volume: Volume::default(),
            rate: PlaybackRate::default(),
        }
    }

    fn send(&self, command: PlaybackCommand) {
        if let Some(thread) = &self.current {
            if let Err(e) = thread.send(command) {
                log::warn!("{}", e);
            }
        }
    }
}

impl Default for SpeakerOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for SpeakerOutput {
    fn attach(&mut self, sink: DeviceEventSink) {
        self.sink = sink;
    }

    fn bind(&mut self, handle: &AudioHandle) -> EngineResult<()> {
        self.unbind();

        let thread = PlaybackThread::start(
            handle.id(),
            handle.bytes().clone(),
            self.sink.clone(),
            Arc::clone(&self.open),
        )?;
        thread.send(PlaybackCommand::SetVolume(self.volume.value()))?;
        thread.send(PlaybackCommand::SetRate(self.rate))?;

        log::debug!("Bound {} ({} bytes)", handle.id(), handle.len());
        self.current = Some(thread);
        Ok(())
    }

    fn unbind(&mut self) {
        if let Some(thread) = self.current.take() {
            thread.stop();
        }
    }

    fn play(&mut self) -> EngineResult<()> {
        match &self.current {
            Some(thread) => thread.send(PlaybackCommand::Play),
            None => Err(EngineError::NoActiveResource),
        }
    }

    fn pause(&mut self) {
        self.send(PlaybackCommand::Pause);
    }

    fn seek(&mut self, position_secs: f64) {
        self.send(PlaybackCommand::Seek(position_secs));
    }

    fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
        self.send(PlaybackCommand::SetVolume(volume.value()));
    }

    fn set_rate(&mut self, rate: PlaybackRate) {
        self.rate = rate;
        self.send(PlaybackCommand::SetRate(rate));
    }
}

/// A running cpal stream fed through a bounded queue
struct CpalWriter {
    _stream: Stream,
    tx: Sender<Vec<f32>>,
}

impl CpalWriter {
    fn open(sample_rate: u32, channels: u16) -> EngineResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::OutputError("No output device available".to_string()))?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, rx) = bounded::<Vec<f32>>(QUEUE_DEPTH);
        let mut buffer = Vec::new();
        let mut position = 0;

        let error_name = device_name.clone();
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for sample in data.iter_mut() {
                        while position >= buffer.len() {
                            match rx.try_recv() {
                                Ok(block) => {
                                    buffer = block;
                                    position = 0;
                                }
                                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                                    *sample = 0.0;
                                    break;
                                }
                            }
                        }

                        if position < buffer.len() {
                            *sample = buffer[position];
                            position += 1;
                        }
                    }
                },
                move |err| {
                    log::error!("Audio output error on device '{}': {}", error_name, err);
                },
                None,
            )
            .map_err(|e| EngineError::OutputError(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| EngineError::OutputError(format!("Failed to start stream: {}", e)))?;

        log::info!(
            "Audio output started on '{}' ({} Hz, {} channels)",
            device_name,
            sample_rate,
            channels
        );

        Ok(Self {
            _stream: stream,
            tx,
        })
    }
}

impl SampleWriter for CpalWriter {
    fn write(&mut self, samples: Vec<f32>) -> bool {
        match self.tx.send_timeout(samples, WRITE_TIMEOUT) {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(_)) => {
                log::warn!("Audio device stalled");
                false
            }
            Err(SendTimeoutError::Disconnected(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::wav_fixture;
    use crate::output::{DeviceEvent, DeviceEventKind};
    use crate::resource::ResourceRegistry;

    fn unavailable() -> OpenWriter {
        Arc::new(|_, _| Err(EngineError::OutputError("no device".to_string())))
    }

    #[test]
    fn test_play_without_binding() {
        let mut output = SpeakerOutput::with_opener(unavailable());
        assert!(matches!(output.play(), Err(EngineError::NoActiveResource)));
        output.pause();
        output.seek(3.0);
    }

    #[test]
    fn test_events_carry_bound_handle() {
        let (tx, rx) = crossbeam_channel::unbounded::<DeviceEvent>();
        let mut output = SpeakerOutput::with_opener(unavailable());
        output.attach(DeviceEventSink::new(move |event| {
            let _ = tx.send(event);
        }));

        let registry = ResourceRegistry::new();
        let first = registry.create(wav_fixture(8000, 800));
        let second = registry.create(wav_fixture(8000, 1600));

        output.bind(&first).unwrap();
        output.bind(&second).unwrap();
        output.play().unwrap();

        let event = loop {
            let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            if event.handle == second.id() && matches!(event.kind, DeviceEventKind::Rejected(_)) {
                break event;
            }
        };
        assert_eq!(event.handle, second.id());

        output.unbind();
        assert!(matches!(output.play(), Err(EngineError::NoActiveResource)));
    }
}
