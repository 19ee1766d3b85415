//! Config file lifecycle as the CLI drives it

use dreamfm_config::{Config, ConfigError, ConfigManager, LogLevel, CONFIG_VERSION};
use std::path::PathBuf;
use tempfile::TempDir;

fn setup_test_manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())?;
    Ok((temp_dir, manager))
}

#[test]
fn test_init_set_reset_restore() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    assert!(manager.initialize()?);
    assert_eq!(manager.load()?.version, CONFIG_VERSION);

    manager.set("network.audio_base_url", "https://audio.example")?;
    manager.set("app.catalog_path", "/srv/dreamfm/books.json")?;

    let config = manager.load()?;
    assert_eq!(config.network.audio_base_url, "https://audio.example");
    assert_eq!(config.app.catalog_path, PathBuf::from("/srv/dreamfm/books.json"));

    manager.reset()?;
    assert_eq!(manager.load()?, Config::default());

    manager.restore_backup()?;
    assert_eq!(manager.load()?.network.audio_base_url, "https://audio.example");

    Ok(())
}

#[test]
fn test_update_applies_several_edits_at_once() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    let written = manager.update(|config| {
        config.set("player.playback_rates", "1, 1.5, 2, 3")?;
        config.player.auto_advance = false;
        Ok(())
    })?;

    assert_eq!(written, manager.load()?);
    assert_eq!(written.player.playback_rates, vec![1.0, 1.5, 2.0, 3.0]);
    assert!(!written.player.auto_advance);

    Ok(())
}

#[test]
fn test_invalid_file_loads_but_fails_check() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    std::fs::write(
        manager.config_path(),
        "[player]\nui_refresh_ms = 0\ndefault_volume = 180\n",
    )?;

    let config = manager.load()?;
    assert_eq!(config.player.ui_refresh_ms, 0);

    match config.ensure_valid() {
        Err(ConfigError::Invalid(problems)) => {
            let fields: Vec<_> = problems.iter().map(|p| p.field.as_str()).collect();
            assert_eq!(fields, ["player.default_volume", "player.ui_refresh_ms"]);
        }
        other => panic!("expected validation failure, got {:?}", other),
    }

    // A valid edit to one field still cannot be saved over the other problem
    assert!(manager.set("player.default_volume", "50").is_err());

    Ok(())
}

#[test]
fn test_hand_written_file() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    std::fs::write(
        manager.config_path(),
        r#"
version = 1

[app]
log_level = "debug"

[player]
playback_rates = [0.75, 1.0, 1.5]
auto_advance_delay_ms = 0

[network]
audio_base_url = "https://cdn.example/audio/"
retry_attempts = 3
"#,
    )?;

    let config = manager.load()?;
    assert_eq!(config.app.log_level, LogLevel::Debug);
    assert_eq!(config.player.playback_rates, vec![0.75, 1.0, 1.5]);
    assert_eq!(config.player.auto_advance_delay_ms, 0);
    assert_eq!(config.network.retry_attempts, 3);
    assert_eq!(config.network.request_timeout_secs, 30);
    assert!(config.ensure_valid().is_ok());

    Ok(())
}

#[test]
fn test_broken_file_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    std::fs::write(manager.config_path(), "[player\nbroken")?;

    assert!(matches!(manager.load(), Err(ConfigError::Parse { .. })));
    assert!(matches!(
        manager.set("player.volume_step", "10"),
        Err(ConfigError::Parse { .. })
    ));

    Ok(())
}

#[test]
fn test_rendered_toml_reads_back() -> Result<(), Box<dyn std::error::Error>> {
    let mut original = Config::default();
    original.set("player.seek_step_secs", "45")?;

    let parsed: Config = toml::from_str(&original.to_toml()?)?;
    assert_eq!(parsed, original);
    Ok(())
}
