//! CLI argument definitions for the Parle application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use parle_core::settings::default_settings_path;

/// Parle — push-to-talk dictation: hold a hotkey, speak, get text pasted.
#[derive(Parser, Debug)]
#[command(name = "parle", version, about)]
pub struct CliArgs {
    /// Path to the settings file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify the configured provider credentials and endpoint.
    Check,
    /// List chat-capable models offered by the configured provider.
    Models,
}

impl CliArgs {
    /// Resolve the settings file path.
    ///
    /// Priority: --config flag > PARLE_CONFIG env var > ~/.parle/settings.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PARLE_CONFIG") {
            return PathBuf::from(p);
        }
        default_settings_path()
    }

    /// Resolve the log filter.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > "info".
    pub fn resolve_log_filter(&self) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    }
}
