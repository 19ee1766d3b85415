//! Application-level configuration section

use crate::error::{ConfigResult, ValidationError};
use crate::validation::{self, ConfigSection};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log level for application logging
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Application-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog file (relative to the working directory if not absolute)
    pub catalog_path: PathBuf,

    /// Log level for application output
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("audiobooks.json"),
            log_level: LogLevel::Info,
        }
    }
}

impl ConfigSection for AppConfig {
    const NAME: &'static str = "app";

    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let catalog = self.catalog_path.as_os_str().is_empty().then(|| {
            ValidationError::new("app.catalog_path", "must not be empty")
        });
        validation::report([catalog])
    }

    fn set(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        match key {
            "catalog_path" => self.catalog_path = PathBuf::from(value.trim()),
            "log_level" => self.log_level = validation::parse(Self::NAME, key, value)?,
            _ => return Err(validation::unknown(Self::NAME, key)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_catalog_path() {
        let mut config = AppConfig::default();
        config.catalog_path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set_fields() {
        let mut config = AppConfig::default();
        config.set("catalog_path", "/srv/books.json").unwrap();
        config.set("log_level", "TRACE").unwrap();

        assert_eq!(config.catalog_path, PathBuf::from("/srv/books.json"));
        assert_eq!(config.log_level, LogLevel::Trace);
        assert!(config.set("log_level", "chatty").is_err());
        assert!(matches!(
            config.set("theme", "dark"),
            Err(crate::ConfigError::UnknownKey(key)) if key == "app.theme"
        ));
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Error.to_string(), "error");
        assert_eq!(LogLevel::Info.to_string(), "info");
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
