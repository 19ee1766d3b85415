//! DreamFM configuration
//!
//! One TOML file with an `[app]`, a `[player]` and a `[network]` table. Each
//! table is a [`ConfigSection`]: it validates itself and accepts textual
//! assignments, so `dreamfm config set player.default_volume 80` and
//! `DREAMFM_PLAYER_DEFAULT_VOLUME=80` share one code path.
//!
//! Reading never rejects out-of-range values, so a damaged file can still be
//! inspected and repaired. Writing always does, and commands that act on the
//! settings call [`Config::ensure_valid`] first.
//!
//! ```rust,no_run
//! use dreamfm_config::ConfigManager;
//!
//! let manager = ConfigManager::new()?;
//! let config = manager.load_with_env_overrides()?;
//! config.ensure_valid()?;
//! println!("Audio from: {}", config.network.audio_base_url);
//! # Ok::<(), dreamfm_config::ConfigError>(())
//! ```

mod error;
mod file;
mod manager;
mod validation;

pub mod app_config;
mod network_config;
mod player_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use validation::ConfigSection;

pub use app_config::{AppConfig, LogLevel};
pub use network_config::NetworkConfig;
pub use player_config::PlayerConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Player preferences
    pub player: PlayerConfig,

    /// Audio delivery settings
    pub network: NetworkConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every problem across all sections
    pub fn problems(&self) -> Vec<ValidationError> {
        [
            self.app.validate(),
            self.player.validate(),
            self.network.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .flatten()
        .collect()
    }

    pub fn ensure_valid(&self) -> ConfigResult<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// Assigns a dotted setting such as `network.audio_base_url`
    pub fn set(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let (section, field) = key
            .split_once('.')
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        if section == AppConfig::NAME {
            self.app.set(field, value)
        } else if section == PlayerConfig::NAME {
            self.player.set(field, value)
        } else if section == NetworkConfig::NAME {
            self.network.set(field, value)
        } else {
            Err(ConfigError::UnknownKey(key.to_string()))
        }
    }

    /// The file form of this config
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            player: PlayerConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}
