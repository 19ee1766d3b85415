//! The config file on disk
//!
//! Writes land in a temporary file beside `config.toml` and are renamed over
//! it. The file being replaced is first copied to `config.toml.bak`, which
//! `dreamfm config restore` puts back.

use crate::error::{ConfigError, ConfigResult};
use crate::{Config, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADER: &str = "# DreamFM player configuration\n\
                      # Unset keys take their defaults; `dreamfm config check` validates this file.\n\n";

pub(crate) struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn backup_path(&self) -> PathBuf {
        self.path.with_extension("toml.bak")
    }

    pub(crate) fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads and parses the file; `None` when there is no file yet
    pub(crate) fn read(&self) -> ConfigResult<Option<Config>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        parse(&self.path, &text).map(Some)
    }

    /// Replaces the file with `config`, which must be valid
    pub(crate) fn write(&self, config: &Config) -> ConfigResult<()> {
        config.ensure_valid()?;
        let text = render(config)?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|source| self.write_error(source))?;

        if self.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup).map_err(|source| ConfigError::Write {
                path: backup,
                source,
            })?;
        }

        let mut staged = tempfile::Builder::new()
            .prefix(".config-")
            .suffix(".toml.tmp")
            .tempfile_in(dir)
            .map_err(|source| self.write_error(source))?;
        staged
            .write_all(text.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|source| self.write_error(source))?;
        staged
            .persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        log::info!("Wrote {}", self.path.display());
        Ok(())
    }

    /// Swaps the backup in for the current file
    pub(crate) fn restore_backup(&self) -> ConfigResult<Config> {
        let backup = ConfigFile::new(self.backup_path());
        let config = backup.read()?.ok_or_else(|| ConfigError::NoBackup {
            path: backup.path.clone(),
        })?;

        fs::rename(&backup.path, &self.path).map_err(|source| self.write_error(source))?;
        log::info!("Restored {} from {}", self.path.display(), backup.path.display());
        Ok(config)
    }

    fn write_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

fn parse(path: &Path, text: &str) -> ConfigResult<Config> {
    if text.trim().is_empty() {
        return Err(ConfigError::Empty {
            path: path.to_path_buf(),
        });
    }

    let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if config.version > CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion {
            found: config.version,
            supported: CONFIG_VERSION,
        });
    }
    Ok(config)
}

fn render(config: &Config) -> ConfigResult<String> {
    Ok(format!("{}{}", HEADER, toml::to_string_pretty(config)?))
}
