//! Playback-related domain models

use crate::types::Validator;
use serde::{Deserialize, Serialize};

/// Playback speed multiplier (0.5x - 3.0x)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackRate(f32);

impl PlaybackRate {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 3.0;

    /// Creates a playback rate, rejecting values outside 0.5 - 3.0
    pub fn new(rate: f32) -> Result<Self, String> {
        if !rate.is_finite() || !(Self::MIN..=Self::MAX).contains(&rate) {
            Err(format!(
                "Speed must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                rate
            ))
        } else {
            Ok(Self(rate))
        }
    }

    /// Returns the multiplier
    pub fn value(&self) -> f32 {
        self.0
    }

    /// Returns true for 1.0x
    pub fn is_normal(&self) -> bool {
        (self.0 - 1.0).abs() < f32::EPSILON
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self(1.0)
    }
}

impl std::fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 1.0 -> "1x", 1.25 -> "1.25x"
        write!(f, "{}x", self.0)
    }
}

impl Validator for PlaybackRate {
    fn validate(&self) -> Result<(), Vec<String>> {
        Self::new(self.0).map(|_| ()).map_err(|e| vec![e])
    }
}

/// The fixed, ordered set of speeds the speed button steps through
#[derive(Debug, Clone, PartialEq)]
pub struct RateCycle {
    rates: Vec<PlaybackRate>,
    index: usize,
}

impl RateCycle {
    /// Speeds offered by default
    pub const DEFAULT_RATES: [f32; 5] = [1.0, 1.25, 1.5, 1.75, 2.0];

    /// Builds a cycle from raw values. Values must be valid rates in strictly
    /// ascending order, and there must be at least one.
    pub fn new(values: &[f32]) -> Result<Self, String> {
        if values.is_empty() {
            return Err("At least one playback rate is required".to_string());
        }

        let rates = values
            .iter()
            .map(|&v| PlaybackRate::new(v))
            .collect::<Result<Vec<_>, _>>()?;

        if rates.windows(2).any(|w| w[0].value() >= w[1].value()) {
            return Err("Playback rates must be strictly ascending".to_string());
        }

        // Start at 1.0x when offered, otherwise at the first rate
        let index = rates.iter().position(|r| r.is_normal()).unwrap_or(0);

        Ok(Self { rates, index })
    }

    /// Current rate
    pub fn current(&self) -> PlaybackRate {
        self.rates[self.index]
    }

    /// Steps to the next rate, wrapping to the first after the last
    pub fn advance(&mut self) -> PlaybackRate {
        self.index = (self.index + 1) % self.rates.len();
        self.current()
    }

    /// All rates in order
    pub fn rates(&self) -> &[PlaybackRate] {
        &self.rates
    }
}

impl Default for RateCycle {
    fn default() -> Self {
        Self {
            rates: Self::DEFAULT_RATES.iter().map(|&v| PlaybackRate(v)).collect(),
            index: 0,
        }
    }
}

/// Output volume as a fraction in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Volume(f32);

impl Volume {
    pub const MAX: Self = Self(1.0);
    pub const MUTE: Self = Self(0.0);

    /// Creates a volume, rejecting non-finite values and values outside [0, 1]
    pub fn new(fraction: f32) -> Result<Self, String> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            Err(format!("Volume must be between 0 and 1, got {}", fraction))
        } else {
            Ok(Self(fraction))
        }
    }

    /// Creates a volume from a 0-100 percentage, clamping above 100
    pub fn from_percent(percent: u8) -> Self {
        Self(f32::from(percent.min(100)) / 100.0)
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    /// Volume as a rounded percentage
    pub fn as_percent(&self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_default() {
        let rate = PlaybackRate::default();
        assert_eq!(rate.value(), 1.0);
        assert!(rate.is_normal());
    }

    #[test]
    fn test_rate_bounds() {
        assert!(PlaybackRate::new(0.5).is_ok());
        assert!(PlaybackRate::new(3.0).is_ok());
        assert!(PlaybackRate::new(0.4).is_err());
        assert!(PlaybackRate::new(3.1).is_err());
        assert!(PlaybackRate::new(f32::NAN).is_err());
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(PlaybackRate::default().to_string(), "1x");
        assert_eq!(PlaybackRate::new(1.25).unwrap().to_string(), "1.25x");
    }

    #[test]
    fn test_cycle_wraps() {
        let mut cycle = RateCycle::default();
        let seen: Vec<f32> = (0..6).map(|_| cycle.advance().value()).collect();
        assert_eq!(seen, vec![1.25, 1.5, 1.75, 2.0, 1.0, 1.25]);
    }

    #[test]
    fn test_cycle_starts_at_normal_speed() {
        let cycle = RateCycle::new(&[0.75, 1.0, 1.5]).unwrap();
        assert_eq!(cycle.current().value(), 1.0);

        let cycle = RateCycle::new(&[1.5, 2.0]).unwrap();
        assert_eq!(cycle.current().value(), 1.5);
    }

    #[test]
    fn test_cycle_rejects_bad_sets() {
        assert!(RateCycle::new(&[]).is_err());
        assert!(RateCycle::new(&[1.0, 1.0]).is_err());
        assert!(RateCycle::new(&[2.0, 1.0]).is_err());
        assert!(RateCycle::new(&[1.0, 5.0]).is_err());
    }

    #[test]
    fn test_volume() {
        assert!(Volume::new(0.0).is_ok());
        assert!(Volume::new(1.0).is_ok());
        assert!(Volume::new(-0.1).is_err());
        assert!(Volume::new(1.1).is_err());
        assert!(Volume::new(f32::NAN).is_err());
        assert_eq!(Volume::from_percent(70).as_percent(), 70);
        assert_eq!(Volume::from_percent(250), Volume::MAX);
    }
}
