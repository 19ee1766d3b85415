//! Player configuration section

use crate::error::{ConfigResult, ValidationError};
use crate::validation::{self, in_range, parse, ConfigSection};
use serde::{Deserialize, Serialize};

/// Player preferences and behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Volume applied when the player starts (0-100)
    pub default_volume: u8,

    /// Speeds the speed button steps through, ascending
    pub playback_rates: Vec<f32>,

    /// Move to the next chapter when one finishes
    pub auto_advance: bool,

    /// Pause between the end of a chapter and loading the next one
    pub auto_advance_delay_ms: u64,

    /// How long a notification stays visible
    pub notification_dismiss_ms: u64,

    /// UI refresh rate in milliseconds
    pub ui_refresh_ms: u64,

    /// Volume change step for increment/decrement (0-100)
    pub volume_step: u8,

    /// Jump size for the seek keys
    pub seek_step_secs: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: 100,
            playback_rates: vec![1.0, 1.25, 1.5, 1.75, 2.0],
            auto_advance: true,
            auto_advance_delay_ms: 1000,
            notification_dismiss_ms: 3000,
            ui_refresh_ms: 100,
            volume_step: 5,
            seek_step_secs: 15,
        }
    }
}

impl PlayerConfig {
    fn rate_problem(&self) -> Option<ValidationError> {
        const FIELD: &str = "player.playback_rates";

        if self.playback_rates.is_empty() {
            return Some(ValidationError::new(FIELD, "must contain at least one rate"));
        }
        if let Some(bad) = self
            .playback_rates
            .iter()
            .find(|r| !r.is_finite() || !(0.5..=3.0).contains(*r))
        {
            return Some(ValidationError::out_of_range(FIELD, 0.5, 3.0, *bad));
        }
        self.playback_rates
            .windows(2)
            .any(|w| w[0] >= w[1])
            .then(|| ValidationError::new(FIELD, "must be strictly ascending"))
    }
}

impl ConfigSection for PlayerConfig {
    const NAME: &'static str = "player";

    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        validation::report([
            in_range("player.default_volume", self.default_volume, 0, 100),
            self.rate_problem(),
            in_range("player.auto_advance_delay_ms", self.auto_advance_delay_ms, 0, 10_000),
            in_range("player.notification_dismiss_ms", self.notification_dismiss_ms, 500, 30_000),
            // Also the UI timer period, which must not be zero
            in_range("player.ui_refresh_ms", self.ui_refresh_ms, 16, 1000),
            in_range("player.volume_step", self.volume_step, 1, 50),
            in_range("player.seek_step_secs", self.seek_step_secs, 1, 600),
        ])
    }

    fn set(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let name = Self::NAME;
        match key {
            "default_volume" => self.default_volume = parse(name, key, value)?,
            // Comma separated: "1, 1.5, 2"
            "playback_rates" => {
                self.playback_rates = value
                    .split(',')
                    .map(|rate| parse(name, key, rate))
                    .collect::<ConfigResult<_>>()?
            }
            "auto_advance" => self.auto_advance = parse(name, key, value)?,
            "auto_advance_delay_ms" => self.auto_advance_delay_ms = parse(name, key, value)?,
            "notification_dismiss_ms" => self.notification_dismiss_ms = parse(name, key, value)?,
            "ui_refresh_ms" => self.ui_refresh_ms = parse(name, key, value)?,
            "volume_step" => self.volume_step = parse(name, key, value)?,
            "seek_step_secs" => self.seek_step_secs = parse(name, key, value)?,
            _ => return Err(validation::unknown(name, key)),
        }
        Ok(())
    }
}
