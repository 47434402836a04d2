//! Parle application binary - composition root.
//!
//! Ties together all Parle crates into a single executable:
//! 1. Load settings from TOML
//! 2. Build the session manager over the real ports (microphone, HTTP
//!    providers, clipboard paster)
//! 3. Start the global hotkey listener
//! 4. Drive sessions from hotkey edges until interrupted
//!
//! `parle check` and `parle models` are one-shot provider diagnostics that
//! exit without starting the listener.

mod cli;

use std::sync::Arc;

use clap::Parser;

use parle_audio::CpalRecorder;
use parle_core::settings::{AppSettings, SettingsStore, TomlSettingsStore};
use parle_core::DictationState;
use parle_hotkey::{parse_combo, HotkeyListener};
use parle_paste::SystemPaster;
use parle_session::{DictationSessionManager, HotkeyDriver, HttpProviderFactory};

use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(args.resolve_log_filter()))
        .init();

    tracing::info!("Starting Parle v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args.resolve_config_path();
    let store = Arc::new(TomlSettingsStore::new(config_path.clone()));
    let settings = store.load();
    tracing::info!(path = %config_path.display(), "Settings loaded");

    match args.command {
        Some(Command::Check) => return run_check(&settings).await,
        Some(Command::Models) => return run_models(&settings).await,
        None => {}
    }

    let manager = Arc::new(DictationSessionManager::new(
        Arc::new(CpalRecorder::new()),
        Arc::new(SystemPaster),
        Arc::new(HttpProviderFactory),
        store,
    ));

    // Log every session transition; errors at warn so they surface with the
    // default filter.
    let mut updates = manager.subscribe();
    tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            match update.state {
                DictationState::Error => {
                    let cause = update.message.as_deref().unwrap_or("unknown");
                    tracing::warn!(cause, "Session error");
                }
                state => tracing::info!(%state, "Session"),
            }
        }
    });

    let combo = parse_combo(&settings.hotkey)?;
    tracing::info!(
        hotkey = %settings.hotkey,
        mode = ?settings.hotkey_mode,
        "Hotkey listener starting"
    );

    let driver = HotkeyDriver::new(manager, settings.hotkey_mode);
    let mut listener = HotkeyListener::spawn(combo);
    loop {
        tokio::select! {
            event = listener.recv() => match event {
                Some(event) => driver.handle(event),
                None => {
                    tracing::error!("Hotkey listener stopped");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// `parle check`: round-trip the provider credentials.
async fn run_check(settings: &AppSettings) -> Result<(), Box<dyn std::error::Error>> {
    match parle_provider::test_connection(settings).await {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(e) => {
            eprintln!("Connection test failed: {e}");
            std::process::exit(1);
        }
    }
}

/// `parle models`: list chat-capable models for mode configuration.
async fn run_models(settings: &AppSettings) -> Result<(), Box<dyn std::error::Error>> {
    let models = parle_provider::fetch_models(&settings.base_url, &settings.api_key).await?;
    for model in models {
        println!("{model}");
    }
    Ok(())
}
