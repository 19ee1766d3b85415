// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use dreamfm_config::{Config, ConfigManager, LogLevel};
use std::path::PathBuf;

mod commands;
mod player;

fn build_cli() -> Command {
    Command::new("dreamfm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal audiobook player for the DreamFM catalog")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the platform config dir)")
                .global(true),
        )
        .arg(
            Arg::new("catalog")
                .short('c')
                .long("catalog")
                .value_name("PATH")
                .help("Catalog JSON file (overrides app.catalog_path)")
                .global(true),
        )
        .subcommand(Command::new("init").about("Write a default config file if none exists"))
        .subcommand(
            Command::new("config")
                .about("Inspect or edit the configuration")
                .subcommand_required(true)
                .subcommand(Command::new("path").about("Print the config file location"))
                .subcommand(Command::new("show").about("Print the settings in effect, overrides included"))
                .subcommand(Command::new("check").about("Validate the settings in effect"))
                .subcommand(
                    Command::new("set")
                        .about("Change one setting, e.g. `set player.default_volume 80`")
                        .arg(Arg::new("key").required(true).value_name("SECTION.FIELD"))
                        .arg(Arg::new("value").required(true).value_name("VALUE")),
                )
                .subcommand(Command::new("reset").about("Write the defaults, keeping a backup"))
                .subcommand(Command::new("restore").about("Put the backup back in place")),
        )
        .subcommand(Command::new("list").about("List all books in the catalog"))
        .subcommand(
            Command::new("info")
                .about("Show details and chapter locations for a book")
                .arg(Arg::new("id").required(true).value_name("BOOK_ID").help("Catalog id of the book")),
        )
        .subcommand(
            Command::new("play")
                .about("Play an audiobook")
                .arg(Arg::new("id").required(true).value_name("BOOK_ID").help("Catalog id of the book to play")),
        )
}

fn config_manager(matches: &ArgMatches) -> Result<ConfigManager> {
    let manager = match matches.get_one::<String>("config") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    };
    manager.context("Failed to locate configuration directory")
}

fn catalog_path(matches: &ArgMatches, config: &Config) -> PathBuf {
    matches
        .get_one::<String>("catalog")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.app.catalog_path.clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let manager = config_manager(&matches)?;
    let loaded = manager.load_with_env_overrides();

    let level = loaded
        .as_ref()
        .map(|config| config.app.log_level)
        .unwrap_or(LogLevel::Info);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.to_string()))
        .init();

    // Config commands must work even when the file does not load
    if let Some(("config", sub_matches)) = matches.subcommand() {
        return commands::config_command(&manager, sub_matches);
    }

    let config =
        loaded.with_context(|| format!("Failed to load {}", manager.config_path().display()))?;

    match matches.subcommand() {
        Some(("init", _)) => commands::init_config(&manager),
        Some(("list", _)) => commands::list_books(&catalog_path(&matches, &config)),
        Some(("info", sub_matches)) => {
            commands::show_book_info(&catalog_path(&matches, &config), &config, sub_matches)
        }
        Some(("play", sub_matches)) => {
            let book_id = sub_matches
                .get_one::<String>("id")
                .ok_or_else(|| anyhow::anyhow!("Book ID is required"))?;
            commands::play_book(&catalog_path(&matches, &config), &config, book_id).await
        }
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
