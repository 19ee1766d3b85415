//! Configuration errors

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An empty file is treated as damaged rather than as "use defaults"
    #[error("{path} is empty")]
    Empty { path: PathBuf },

    #[error("Invalid configuration: {}", list(.0))]
    Invalid(Vec<ValidationError>),

    #[error("Config version {found} is newer than this build understands ({supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("No config directory is known for this platform")]
    NoConfigDir,

    #[error("No backup exists at {path}")]
    NoBackup { path: PathBuf },

    #[error("Unknown setting '{0}'")]
    UnknownKey(String),

    #[error("'{value}' is not a valid value for {key}")]
    BadValue { key: String, value: String },
}

fn list(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One field that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path such as `player.default_volume`
    pub field: String,
    pub problem: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }

    pub fn out_of_range<T: std::fmt::Display>(field: &str, min: T, max: T, got: T) -> Self {
        Self::new(field, format!("must be between {} and {} (got {})", min, max, got))
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.problem)
    }
}

impl std::error::Error for ValidationError {}
