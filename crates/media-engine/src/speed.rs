//! Time-stretching for non-1x playback rates
//!
//! Narration is stretched with windowed overlap-add so voices keep their
//! pitch; plain linear interpolation is available when that is not wanted.

use dreamfm_core::PlaybackRate;

/// Changes the tempo of interleaved sample blocks
pub struct SpeedProcessor {
    channels: usize,
    rate: PlaybackRate,
    preserve_pitch: bool,
    planes: Vec<Vec<f32>>,
}

impl SpeedProcessor {
    pub fn new(channels: u16) -> Self {
        let channels = usize::from(channels.max(1));
        Self {
            channels,
            rate: PlaybackRate::default(),
            preserve_pitch: true,
            planes: vec![Vec::new(); channels],
        }
    }

    pub fn set_rate(&mut self, rate: PlaybackRate) {
        self.rate = rate;
    }

    pub fn rate(&self) -> PlaybackRate {
        self.rate
    }

    pub fn set_preserve_pitch(&mut self, enabled: bool) {
        self.preserve_pitch = enabled;
    }

    pub fn preserves_pitch(&self) -> bool {
        self.preserve_pitch
    }

    /// Returns `input` played at the current rate
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        if input.is_empty() || self.rate.is_normal() {
            return input.to_vec();
        }

        for plane in &mut self.planes {
            plane.clear();
        }
        for (i, &sample) in input.iter().enumerate() {
            self.planes[i % self.channels].push(sample);
        }

        let frames = self.planes[0].len();
        let speed = self.rate.value();
        let output_frames = (frames as f32 / speed) as usize;

        let stretched: Vec<Vec<f32>> = if self.preserve_pitch {
            self.planes
                .iter()
                .map(|plane| overlap_add(plane, speed, output_frames))
                .collect()
        } else {
            self.planes
                .iter()
                .map(|plane| interpolate(plane, speed, output_frames))
                .collect()
        };

        let mut output = Vec::with_capacity(output_frames * self.channels);
        for frame in 0..output_frames {
            for plane in &stretched {
                output.push(plane.get(frame).copied().unwrap_or(0.0));
            }
        }
        output
    }
}

/// Hann-windowed overlap-add: read hops scale with speed, write hops don't
fn overlap_add(input: &[f32], speed: f32, output_frames: usize) -> Vec<f32> {
    let frames = input.len();
    let window_size = (frames / 4).clamp(64, 1024).min(frames.max(1));
    let hop_out = (window_size / 2).max(1);
    let hop_in = ((hop_out as f32) * speed).max(1.0) as usize;
    let window = hann_window(window_size);

    let mut output = vec![0.0f32; output_frames];
    let mut weight = vec![0.0f32; output_frames];

    let mut in_pos = 0;
    let mut out_pos = 0;
    while in_pos < frames && out_pos < output_frames {
        for (i, &w) in window.iter().enumerate() {
            let (src, dst) = (in_pos + i, out_pos + i);
            if src >= frames || dst >= output_frames {
                break;
            }
            output[dst] += input[src] * w;
            weight[dst] += w;
        }
        in_pos += hop_in;
        out_pos += hop_out;
    }

    for (sample, w) in output.iter_mut().zip(weight) {
        if w > 1e-3 {
            *sample /= w;
        }
    }
    output
}

fn interpolate(input: &[f32], speed: f32, output_frames: usize) -> Vec<f32> {
    (0..output_frames)
        .map(|out_frame| {
            let position = out_frame as f32 * speed;
            let index = position as usize;
            let frac = position - index as f32;
            match (input.get(index), input.get(index + 1)) {
                (Some(&s0), Some(&s1)) => s0 + (s1 - s0) * frac,
                (Some(&s0), None) => s0,
                _ => 0.0,
            }
        })
        .collect()
}

fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            let phase = std::f32::consts::PI * 2.0 * i as f32 / (size - 1) as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}
