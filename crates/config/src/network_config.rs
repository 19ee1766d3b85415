//! Network configuration section

use crate::error::{ConfigResult, ValidationError};
use crate::validation::{self, in_range, parse, ConfigSection};
use serde::{Deserialize, Serialize};

/// Audio delivery endpoint and request behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Base URL chapters are fetched from
    pub audio_base_url: String,

    /// Limit for one chapter request, body included
    pub request_timeout_secs: u64,

    /// Attempts per chapter request; 1 disables automatic retry
    pub retry_attempts: u32,

    /// Delay before the first retry, doubled for each further one
    pub retry_initial_delay_ms: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            audio_base_url: "http://localhost:8787".to_string(),
            request_timeout_secs: 30,
            retry_attempts: 1,
            retry_initial_delay_ms: 500,
            user_agent: concat!("DreamFM/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ConfigSection for NetworkConfig {
    const NAME: &'static str = "network";

    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        validation::report([
            validation::http_url("network.audio_base_url", &self.audio_base_url),
            in_range("network.request_timeout_secs", self.request_timeout_secs, 1, 300),
            in_range("network.retry_attempts", self.retry_attempts, 1, 10),
            in_range("network.retry_initial_delay_ms", self.retry_initial_delay_ms, 0, 60_000),
            validation::not_blank("network.user_agent", &self.user_agent),
        ])
    }

    fn set(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let name = Self::NAME;
        match key {
            "audio_base_url" => self.audio_base_url = value.trim().to_string(),
            "request_timeout_secs" => self.request_timeout_secs = parse(name, key, value)?,
            "retry_attempts" => self.retry_attempts = parse(name, key, value)?,
            "retry_initial_delay_ms" => self.retry_initial_delay_ms = parse(name, key, value)?,
            "user_agent" => self.user_agent = value.to_string(),
            _ => return Err(validation::unknown(name, key)),
        }
        Ok(())
    }
}
