//! Heirloom application binary - composition root.
//!
//! Ties together the Heirloom crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Open the SQLite store and run migrations
//! 3. Start the axum REST API server

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use heirloom_api::{routes, AppState};
use heirloom_core::config::HeirloomConfig;
use heirloom_questionnaire::default_catalog;
use heirloom_store::{Database, SqliteStore};

mod cli;

use cli::{CliArgs, Command};

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing.
    let default_filter = args
        .resolve_log_level()
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    if let Some(Command::Catalog) = args.command {
        let catalog = default_catalog();
        println!("{}", serde_json::to_string_pretty(catalog.sections())?);
        return Ok(());
    }

    tracing::info!("Starting Heirloom v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = args.resolve_config_path();
    let config = HeirloomConfig::load_or_default(&config_file);
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = resolve_data_dir(
        &args
            .resolve_data_dir()
            .unwrap_or_else(|| config.general.data_dir.clone()),
    );
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("heirloom.db");
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    let store = SqliteStore::new(Arc::new(db));
    let state = AppState::new(store);

    // API server.
    let port = args.resolve_port(config.api.port);
    if let Err(e) = routes::start_server(state, port).await {
        tracing::error!(error = %e, "Server exited with error");
        return Err(e.into());
    }

    Ok(())
}
