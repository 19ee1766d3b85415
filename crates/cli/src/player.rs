// FILE: crates/cli/src/player.rs
//! Interactive terminal player

use anyhow::{Context, Result};
use console::{style, Key, Term};
use dreamfm_config::{Config, NetworkConfig, PlayerConfig};
use dreamfm_core::{BookMetadata, RateCycle, Volume};
use dreamfm_media_engine::{
    EngineConfig, EngineState, PlayerHandle, PlayerService, PlayerView, ServiceConfig,
    SpeakerOutput, Toast, ToastCenter,
};
use dreamfm_network::{Client, ClientConfig, HttpChapterSource};
use dreamfm_resilience::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const BAR_WIDTH: usize = 40;

/// What a key press asks the player to do
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    TogglePlay,
    SeekBy(f64),
    Next,
    Previous,
    VolumeBy(i16),
    CycleRate,
    ToggleChapters,
    ToggleFull,
    Select(u32),
    Quit,
}

pub async fn start_playback(config: &Config, book: BookMetadata) -> Result<()> {
    let client = Client::with_config(client_config(&config.network))
        .context("Failed to create HTTP client")?;
    let source = HttpChapterSource::new(client, &config.network.audio_base_url)
        .context("Invalid network.audio_base_url")?;

    let toasts = Arc::new(ToastCenter::new(Duration::from_millis(
        config.player.notification_dismiss_ms,
    )));

    let (player, task) = PlayerService::spawn(
        service_config(config)?,
        Box::new(SpeakerOutput::new()),
        toasts.clone(),
        Arc::new(source),
    );

    player.open(book).context("Player stopped unexpectedly")?;

    let term = Term::stdout();
    if term.hide_cursor().is_err() {
        log::warn!("Failed to hide cursor");
    }

    let result = player_loop(&term, &player, &toasts, &config.player).await;

    let _ = term.show_cursor();
    let _ = player.close();
    drop(player);
    task.await.context("Player task failed")?;

    result
}

fn service_config(config: &Config) -> Result<ServiceConfig> {
    // The client bounds each attempt; this bounds the whole fetch, retries included
    let attempts = u64::from(config.network.retry_attempts.max(1));
    let fetch_timeout = Duration::from_secs(config.network.request_timeout_secs * attempts)
        + Duration::from_millis(config.network.retry_initial_delay_ms * attempts * 2);

    Ok(ServiceConfig {
        engine: engine_config(&config.player)?,
        fetch_timeout: Some(fetch_timeout),
    })
}

fn engine_config(player: &PlayerConfig) -> Result<EngineConfig> {
    let rates = RateCycle::new(&player.playback_rates)
        .map_err(|e| anyhow::anyhow!("Invalid player.playback_rates: {}", e))?;

    Ok(EngineConfig {
        rates,
        initial_volume: Volume::from_percent(player.default_volume),
        auto_advance: player.auto_advance,
        auto_advance_delay: Duration::from_millis(player.auto_advance_delay_ms),
    })
}

fn client_config(network: &NetworkConfig) -> ClientConfig {
    ClientConfig {
        timeout: Duration::from_secs(network.request_timeout_secs),
        user_agent: network.user_agent.clone(),
        retry_policy: RetryPolicy::new(network.retry_attempts as usize)
            .with_initial_delay(Duration::from_millis(network.retry_initial_delay_ms)),
        ..ClientConfig::default()
    }
}

async fn player_loop(
    term: &Term,
    player: &PlayerHandle,
    toasts: &ToastCenter,
    settings: &PlayerConfig,
) -> Result<()> {
    let (key_tx, mut keys) = mpsc::unbounded_channel();
    spawn_key_reader(key_tx);

    let mut views = player.subscribe();
    let mut refresh = tokio::time::interval(Duration::from_millis(settings.ui_refresh_ms.max(1)));
    let mut last_frame = Vec::new();

    loop {
        let view = views.borrow().clone();
        let frame = render_lines(&view, toasts.visible().as_ref());
        if frame != last_frame {
            term.clear_screen().context("Failed to clear screen")?;
            for line in &frame {
                term.write_line(line).context("Failed to draw player")?;
            }
            last_frame = frame;
        }

        tokio::select! {
            key = keys.recv() => {
                let Some(key) = key else { break };
                let Some(action) = action_for(&key, settings) else { continue };
                if action == Action::Quit {
                    break;
                }
                apply(player, &view, action)?;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = refresh.tick() => {}
        }
    }

    Ok(())
}

/// Reads keys on a plain thread; `read_key` blocks and cannot be cancelled
fn spawn_key_reader(tx: mpsc::UnboundedSender<Key>) {
    std::thread::spawn(move || {
        let term = Term::stdout();
        while let Ok(key) = term.read_key() {
            if tx.send(key).is_err() {
                break;
            }
        }
    });
}

fn action_for(key: &Key, settings: &PlayerConfig) -> Option<Action> {
    let seek = settings.seek_step_secs as f64;
    let volume = i16::from(settings.volume_step);

    match key {
        Key::Char(' ') => Some(Action::TogglePlay),
        Key::ArrowLeft => Some(Action::SeekBy(-seek)),
        Key::ArrowRight => Some(Action::SeekBy(seek)),
        Key::Char('n') => Some(Action::Next),
        Key::Char('p') => Some(Action::Previous),
        Key::Char('+') | Key::Char('=') => Some(Action::VolumeBy(volume)),
        Key::Char('-') | Key::Char('_') => Some(Action::VolumeBy(-volume)),
        Key::Char('s') => Some(Action::CycleRate),
        Key::Char('c') => Some(Action::ToggleChapters),
        Key::Char('f') => Some(Action::ToggleFull),
        Key::Char(c @ '1'..='9') => c.to_digit(10).map(Action::Select),
        Key::Char('q') | Key::Escape => Some(Action::Quit),
        _ => None,
    }
}

fn apply(player: &PlayerHandle, view: &PlayerView, action: Action) -> Result<()> {
    let sent = match action {
        Action::TogglePlay => player.toggle_play_pause(),
        Action::SeekBy(delta) => player.seek_by(delta),
        Action::Next => player.next_chapter(),
        Action::Previous => player.previous_chapter(),
        Action::VolumeBy(delta) => {
            let percent = (i16::from(view.full.volume_percent) + delta).clamp(0, 100);
            player.set_volume(f32::from(percent) / 100.0)
        }
        Action::CycleRate => player.cycle_playback_rate(),
        Action::ToggleChapters => player.toggle_chapter_list(),
        Action::ToggleFull => player.toggle_full_player(),
        Action::Select(chapter) => player.select_chapter(chapter),
        Action::Quit => Ok(()),
    };
    sent.context("Player stopped unexpectedly")
}

fn render_lines(view: &PlayerView, toast: Option<&Toast>) -> Vec<String> {
    let mut lines = Vec::new();

    if view.state == EngineState::Closed {
        lines.push("  Player closed".to_string());
        return lines;
    }
    if !view.mini.visible {
        lines.push("  Nothing playing".to_string());
        return lines;
    }

    if view.full.visible {
        let full = &view.full;
        lines.push(format!("\n  {}", style(&full.title).bold().cyan()));
        lines.push(format!("  by {}", style(&full.author).dim()));
        lines.push(String::new());
        lines.push(format!("  {} ({})", full.chapter_title, full.chapter_label));
        lines.push(format!("  {} / {}", full.elapsed, full.duration));
        lines.push(format!("  {}", progress_bar(full.progress, BAR_WIDTH)));
        lines.push(String::new());
        lines.push(format!("  {} {}", full.play_icon.symbol(), status_label(view.state)));
        lines.push(format!("  Speed: {}   Volume: {}%", full.rate_label, full.volume_percent));

        if full.chapter_list_visible {
            lines.push(String::new());
            lines.push("  Chapters:".to_string());
            for entry in &full.chapters {
                let marker = if entry.active { "▶" } else { " " };
                lines.push(format!("   {} {}", marker, entry.title));
            }
        }
    } else {
        let mini = &view.mini;
        lines.push(format!(
            "\n  {} {} · {}  {}",
            mini.play_icon.symbol(),
            style(&mini.title).bold(),
            mini.chapter_title,
            progress_bar(mini.progress, BAR_WIDTH / 2)
        ));
    }

    if let Some(toast) = toast {
        lines.push(String::new());
        lines.push(format!("  » {}", style(&toast.message).yellow()));
    }

    lines.push(String::new());
    lines.push("  Space play/pause · ←/→ seek · n/p chapter · 1-9 jump".to_string());
    lines.push("  +/- volume · s speed · c chapters · f full/mini · q quit".to_string());
    lines
}

fn status_label(state: EngineState) -> &'static str {
    match state {
        EngineState::Idle => "Idle",
        EngineState::Loading => "Loading…",
        EngineState::Ready => "Paused",
        EngineState::Playing => "Playing",
        EngineState::Closed => "Closed",
    }
}

fn progress_bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = ((fraction * width as f64).round() as usize).min(width);
    format!(
        "[{}{}] {:>3}%",
        "=".repeat(filled),
        " ".repeat(width - filled),
        (fraction * 100.0).round() as u32
    )
}
