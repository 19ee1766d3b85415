//! Chapter decoding
//!
//! Chapters arrive as complete in-memory payloads, so the decoder reads
//! straight from the shared [`Bytes`] buffer of an audio handle.

use crate::error::{EngineError, EngineResult};
use bytes::Bytes;
use std::io::Cursor;
use symphonia::core::audio::{AudioBufferRef, SampleBuffer, SignalSpec};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

pub struct AudioDecoder {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    spec: SignalSpec,
    duration: Option<f64>,
}

/// Interleaved samples from one packet
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub spec: SignalSpec,
}

impl DecodedAudio {
    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        let channels = self.spec.channels.count().max(1);
        self.samples.len() / channels
    }

    /// Playing time of the packet in seconds
    pub fn seconds(&self) -> f64 {
        self.frames() as f64 / f64::from(self.spec.rate.max(1))
    }
}

impl AudioDecoder {
    /// Probes `bytes` and prepares a decoder for its default track
    pub fn from_bytes(bytes: Bytes) -> EngineResult<Self> {
        if bytes.is_empty() {
            return Err(EngineError::DecodeError("Empty audio payload".to_string()));
        }

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| EngineError::DecodeError(format!("Failed to probe format: {}", e)))?;

        let reader = probed.format;

        let track = reader
            .default_track()
            .ok_or_else(|| EngineError::DecodeError("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| EngineError::DecodeError(format!("Failed to create decoder: {}", e)))?;

        let spec = SignalSpec::new(
            codec_params.sample_rate.unwrap_or(44100),
            codec_params.channels.unwrap_or_default(),
        );

        let duration = match (codec_params.n_frames, codec_params.sample_rate) {
            (Some(frames), Some(rate)) if rate > 0 => Some(frames as f64 / f64::from(rate)),
            _ => None,
        };

        Ok(Self {
            reader,
            decoder,
            track_id,
            spec,
            duration,
        })
    }

    /// Decodes the next packet of the track, `None` at end of stream
    pub fn decode_next(&mut self) -> EngineResult<Option<DecodedAudio>> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => {
                    return Err(EngineError::DecodeError(format!(
                        "Failed to read packet: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("Decode error, skipping packet: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(EngineError::DecodeError(format!(
                        "Failed to decode packet: {}",
                        e
                    )));
                }
            };

            let spec = *decoded.spec();
            let samples = interleave(decoded);

            return Ok(Some(DecodedAudio { samples, spec }));
        }
    }

    pub fn spec(&self) -> &SignalSpec {
        &self.spec
    }

    /// Track length in seconds when the container declares it
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn seek(&mut self, time_secs: f64) -> EngineResult<()> {
        let timestamp = (time_secs.max(0.0) * f64::from(self.spec.rate)) as u64;

        self.reader
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts: timestamp,
                    track_id: self.track_id,
                },
            )
            .map_err(|e| EngineError::SeekError(format!("Failed to seek: {}", e)))?;

        self.decoder.reset();

        Ok(())
    }
}

fn interleave(decoded: AudioBufferRef<'_>) -> Vec<f32> {
    let spec = *decoded.spec();
    let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
    buffer.copy_interleaved_ref(decoded);
    buffer.samples().to_vec()
}

/// Mono 16-bit PCM WAV used as a decodable payload in tests
#[cfg(test)]
pub(crate) fn wav_fixture(sample_rate: u32, frames: u32) -> Bytes {
    let data_len = frames * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for i in 0..frames {
        let sample = ((i % 100) as i16 - 50) * 200;
        out.extend_from_slice(&sample.to_le_bytes());
    }
    Bytes::from(out)
}
