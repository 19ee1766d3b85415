//! Locating, reading and editing the config file

use crate::error::{ConfigError, ConfigResult};
use crate::file::ConfigFile;
use crate::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "DREAMFM_";

/// Front door for everything the CLI does with its settings
pub struct ConfigManager {
    file: ConfigFile,
}

impl ConfigManager {
    /// Uses the platform config directory, e.g. `~/.config/dreamfm/` on Linux
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", "dreamfm").ok_or(ConfigError::NoConfigDir)?;
        Self::with_directory(dirs.config_dir().to_path_buf())
    }

    pub fn with_directory(dir: PathBuf) -> ConfigResult<Self> {
        Ok(Self {
            file: ConfigFile::new(dir.join(FILE_NAME)),
        })
    }

    pub fn config_path(&self) -> &Path {
        self.file.path()
    }

    pub fn backup_path(&self) -> PathBuf {
        self.file.backup_path()
    }

    /// The file's settings, or the defaults when there is no file
    pub fn load(&self) -> ConfigResult<Config> {
        let config = self.file.read()?.unwrap_or_else(|| {
            log::debug!("No config at {}, using defaults", self.config_path().display());
            Config::default()
        });

        for problem in config.problems() {
            log::warn!("{}: {}", self.config_path().display(), problem);
        }
        Ok(config)
    }

    /// [`load`](Self::load) followed by `DREAMFM_SECTION_FIELD` variables
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, std::env::vars());
        Ok(config)
    }

    /// Writes the defaults unless a file already exists; true when written
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.file.exists() {
            return Ok(false);
        }
        self.file.write(&Config::default())?;
        Ok(true)
    }

    /// Loads, edits and writes back; nothing is written if `edit` fails or
    /// leaves the config invalid
    pub fn update<F>(&self, edit: F) -> ConfigResult<Config>
    where
        F: FnOnce(&mut Config) -> ConfigResult<()>,
    {
        let mut config = self.load()?;
        edit(&mut config)?;
        self.file.write(&config)?;
        Ok(config)
    }

    /// Sets one dotted key, e.g. `player.default_volume`
    pub fn set(&self, key: &str, value: &str) -> ConfigResult<Config> {
        self.update(|config| config.set(key, value))
    }

    /// Replaces the file with the defaults, keeping the old one as backup
    pub fn reset(&self) -> ConfigResult<()> {
        self.file.write(&Config::default())
    }

    /// Puts the file replaced by the last write back
    pub fn restore_backup(&self) -> ConfigResult<Config> {
        self.file.restore_backup()
    }
}

/// Applies every `DREAMFM_<SECTION>_<FIELD>` entry of `vars`
///
/// Entries that name no setting or hold an unusable value are skipped with
/// a warning, so a stray variable never stops the player from starting.
fn apply_env_overrides<I>(config: &mut Config, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (name, value) in vars {
        let Some(rest) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let key = match rest.to_ascii_lowercase().split_once('_') {
            Some((section, field)) => format!("{}.{}", section, field),
            None => rest.to_ascii_lowercase(),
        };

        match config.set(&key, &value) {
            Ok(()) => log::info!("{} overrides {}", name, key),
            Err(e) => log::warn!("Ignoring {}: {}", name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogLevel;
    use tempfile::TempDir;

    fn manager() -> (TempDir, ConfigManager) {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();
        (dir, manager)
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_without_file_gives_defaults() {
        let (_dir, manager) = manager();
        assert_eq!(manager.load().unwrap(), Config::default());
        assert!(!manager.config_path().exists());
    }

    #[test]
    fn test_initialize_only_once() {
        let (_dir, manager) = manager();
        assert!(manager.initialize().unwrap());
        assert!(!manager.initialize().unwrap());
        assert!(manager.config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_set_persists() {
        let (_dir, manager) = manager();
        manager.set("player.default_volume", "65").unwrap();

        assert_eq!(manager.load().unwrap().player.default_volume, 65);
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let (_dir, manager) = manager();
        manager.initialize().unwrap();

        assert!(manager.set("player.ui_refresh_ms", "0").is_err());
        assert!(manager.set("player.colour", "red").is_err());
        assert_eq!(manager.load().unwrap(), Config::default());
        assert!(!manager.backup_path().exists());
    }

    #[test]
    fn test_reset_then_restore() {
        let (_dir, manager) = manager();
        manager.set("network.retry_attempts", "4").unwrap();

        manager.reset().unwrap();
        assert_eq!(manager.load().unwrap().network.retry_attempts, 1);

        let restored = manager.restore_backup().unwrap();
        assert_eq!(restored.network.retry_attempts, 4);
        assert_eq!(manager.load().unwrap().network.retry_attempts, 4);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            vars(&[
                ("DREAMFM_PLAYER_DEFAULT_VOLUME", "85"),
                ("DREAMFM_PLAYER_AUTO_ADVANCE_DELAY_MS", "250"),
                ("DREAMFM_NETWORK_AUDIO_BASE_URL", "https://cdn.example"),
                ("DREAMFM_APP_LOG_LEVEL", "debug"),
                ("HOME", "/root"),
            ]),
        );

        assert_eq!(config.player.default_volume, 85);
        assert_eq!(config.player.auto_advance_delay_ms, 250);
        assert_eq!(config.network.audio_base_url, "https://cdn.example");
        assert_eq!(config.app.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_bad_env_overrides_skipped() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            vars(&[
                ("DREAMFM_NETWORK_RETRY_ATTEMPTS", "lots"),
                ("DREAMFM_PLAYER", "x"),
                ("DREAMFM_LIBRARY_PATH", "/books"),
            ]),
        );

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_override_keeps_out_of_range_value_for_checking() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, vars(&[("DREAMFM_PLAYER_UI_REFRESH_MS", "0")]));

        assert_eq!(config.player.ui_refresh_ms, 0);
        assert!(config.ensure_valid().is_err());
    }
}
