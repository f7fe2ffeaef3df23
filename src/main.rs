//! Main application entry point (CLI binary).
//!
//! Thin wrapper around the `linkback` library: parses CLI arguments, loads
//! `.env`, initializes the logger, opens the store, and runs the inbound
//! notification server.

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use linkback::config::Config;
use linkback::error_handling::ProcessingStats;
use linkback::fetch::Fetcher;
use linkback::ingest::Pipeline;
use linkback::initialization::{init_client, init_logger_with};
use linkback::server::{start_server, AppState};
use linkback::store::sqlite::SqliteStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    let _ = dotenvy::dotenv();

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let store = match SqliteStore::open(&config.db_path).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("linkback error: failed to open database: {e:#}");
            process::exit(1);
        }
    };

    let client = init_client(&config).context("Failed to initialize HTTP client")?;
    let fetcher = Fetcher::new(client);
    let stats = Arc::new(ProcessingStats::new());

    let pipeline = Arc::new(Pipeline::new(
        fetcher,
        store.clone(),
        store.clone(),
        Arc::clone(&stats),
    ));

    let state = AppState {
        pipeline,
        content: store,
        base_url: config.base_url.clone(),
    };

    let port = config.port;
    if let Err(e) = start_server(port, state).await {
        stats.log_summary();
        eprintln!("linkback error: {e:#}");
        process::exit(1);
    }

    stats.log_summary();
    Ok(())
}
