//! CLI argument definitions for the Heirloom server binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Heirloom — the legacy letter questionnaire backend.
#[derive(Parser, Debug)]
#[command(name = "heirloom", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Data directory for the SQLite database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the API server (the default when no subcommand is given).
    Serve,
    /// Print the built-in section and question catalog as JSON.
    Catalog,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HEIRLOOM_CONFIG env var > ~/.heirloom/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("HEIRLOOM_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > HEIRLOOM_PORT env var > config file value > 4040.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("HEIRLOOM_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        4040
    }

    /// Resolve the data directory override, if any.
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level override, if any.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".heirloom").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".heirloom").join("config.toml");
    }
    PathBuf::from("config.toml")
}
