// FILE: crates/cli/src/commands.rs

use anyhow::{Context, Result};
use clap::ArgMatches;
use console::style;
use dreamfm_config::{Config, ConfigManager};
use dreamfm_core::{AppError, BookId, BookMetadata, Catalog};
use dreamfm_network::chapter_url;
use std::path::Path;

/// Write a default config file
pub fn init_config(manager: &ConfigManager) -> Result<()> {
    let created = manager
        .initialize()
        .context("Failed to write default configuration")?;

    let path = manager.config_path();
    if created {
        println!("{} Config written to {}", style("✓").green().bold(), path.display());
    } else {
        println!("Config already exists at {}", path.display());
    }
    Ok(())
}

/// List all books in the catalog
pub fn list_books(catalog_path: &Path) -> Result<()> {
    let catalog = match load_catalog(catalog_path) {
        Ok(catalog) => catalog,
        Err(AppError::EmptyCatalog) => {
            println!("{}", AppError::EmptyCatalog.user_message());
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load {}", catalog_path.display()))
        }
    };

    println!("\n{} Books in Catalog", style(catalog.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for book in catalog.books() {
        print_book_summary(book);
    }

    Ok(())
}

/// Show detailed information about a book
pub fn show_book_info(catalog_path: &Path, config: &Config, matches: &ArgMatches) -> Result<()> {
    let id = matches
        .get_one::<String>("id")
        .ok_or_else(|| anyhow::anyhow!("Book ID is required"))?;

    let book = find_book(catalog_path, id)?;

    println!("\n{}", style("Book Information").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("ID: {}", book.id);
    println!("Title: {}", style(&book.title).bold());
    println!("Author: {}", book.display_author());

    if let Some(narrator) = &book.narrator {
        println!("Narrator: {}", narrator);
    }
    if let Some(category) = &book.category {
        println!("Category: {}", category);
    }
    if let Some(duration) = &book.duration {
        println!("Duration: {}", duration);
    }
    if let Some(rating) = book.rating {
        println!("Rating: {:.1}/5", rating);
    }
    if let Some(description) = &book.description {
        println!("\nDescription:\n{}", description);
    }

    println!("\nChapters ({}):", book.total_chapters);
    for line in chapter_lines(&config.network.audio_base_url, &book) {
        println!("  {}", line);
    }

    Ok(())
}

/// Play an audiobook
pub async fn play_book(catalog_path: &Path, config: &Config, book_id: &str) -> Result<()> {
    config
        .ensure_valid()
        .context("Cannot play with this configuration (see `dreamfm config check`)")?;
    let book = find_book(catalog_path, book_id)?;

    println!("\n{} {}", style("▶").green().bold(), style(&book.title).bold());
    println!("by {}", book.display_author());

    crate::player::start_playback(config, book).await
}

/// Inspect or edit the config file
pub fn config_command(manager: &ConfigManager, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("path", _)) => println!("{}", manager.config_path().display()),
        Some(("show", _)) => print!("{}", effective_config(manager)?.to_toml()?),
        Some(("check", _)) => check_config(&effective_config(manager)?)?,
        Some(("set", sub)) => {
            let key = required(sub, "key")?;
            let value = required(sub, "value")?;
            manager
                .set(key, value)
                .with_context(|| format!("Failed to set {}", key))?;
            println!("{} {} = {}", style("✓").green().bold(), key, value);
        }
        Some(("reset", _)) => {
            manager.reset().context("Failed to reset configuration")?;
            println!(
                "{} Defaults written; the previous file is at {}",
                style("✓").green().bold(),
                manager.backup_path().display()
            );
        }
        Some(("restore", _)) => {
            manager
                .restore_backup()
                .context("Failed to restore configuration")?;
            println!(
                "{} Restored {}",
                style("✓").green().bold(),
                manager.config_path().display()
            );
        }
        _ => anyhow::bail!("Unknown config command"),
    }
    Ok(())
}

fn effective_config(manager: &ConfigManager) -> Result<Config> {
    manager
        .load_with_env_overrides()
        .with_context(|| format!("Failed to load {}", manager.config_path().display()))
}

fn check_config(config: &Config) -> Result<()> {
    let problems = config.problems();
    if problems.is_empty() {
        println!("{} Configuration is valid", style("✓").green().bold());
        return Ok(());
    }

    for problem in &problems {
        println!("  {} {}", style("✗").red().bold(), problem);
    }
    anyhow::bail!("{} problem(s) in configuration", problems.len())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} is required", name))
}

fn load_catalog(path: &Path) -> dreamfm_core::Result<Catalog> {
    Catalog::load(path)
}

fn find_book(catalog_path: &Path, id: &str) -> Result<BookMetadata> {
    let catalog = load_catalog(catalog_path)
        .with_context(|| format!("Failed to load {}", catalog_path.display()))?;

    catalog.open_book(&BookId::new(id)).map_err(|e| {
        anyhow::anyhow!("{} ({})", e.user_message(), id)
    })
}

fn chapter_lines(base_url: &str, book: &BookMetadata) -> Vec<String> {
    (1..=book.total_chapters)
        .map(|n| format!("{:>3}. {}", n, chapter_url(base_url, &book.audio_slug, n)))
        .collect()
}

fn print_book_summary(book: &BookMetadata) {
    println!("\n{}", style(&book.title).bold());
    println!("  by {}", book.display_author());
    println!(
        "  ID: {} | Chapters: {}{}",
        truncate(book.id.as_str(), 12),
        book.total_chapters,
        book.duration
            .as_deref()
            .map(|d| format!(" | Duration: {}", d))
            .unwrap_or_default()
    );
}

fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}
