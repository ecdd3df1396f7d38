mod connection;
mod gate;
mod shell;
mod status_bar;
mod theme;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::prelude::*;

use deck_core::bridge::HubLayer;
use deck_core::config::Config;
use deck_core::log::LogHub;
use deck_core::platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();

    std::fs::create_dir_all(platform::data_dir())?;
    if let Some(parent) = config.log.file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log.file)?;

    let hub = Arc::new(LogHub::new());

    // Allow RUST_LOG override; default filter comes from config.  The
    // hub layer stays unfiltered so warnings always reach the status
    // bar.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.filter));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_filter(filter),
        )
        .with(HubLayer::new(Arc::clone(&hub)))
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("tapedeck log: {}", config.log.file.display());

    tracing::info!("tapedeck starting…");

    // ── Shell event queue ────────────────────────────────────────────────────
    let (tx, rx) = mpsc::unbounded_channel();

    // ── Engine connection reader ─────────────────────────────────────────────
    let reader = connection::spawn_reader(
        config.engine.address.clone(),
        Arc::clone(&hub),
        tx.clone(),
    );

    // ── Run shell ────────────────────────────────────────────────────────────
    let shell = shell::Shell::new(Arc::clone(&hub), tx.clone());
    shell.run(tx, rx).await?;

    reader.abort();
    Ok(())
}
