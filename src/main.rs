use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use termrelay::bot::Bot;
use termrelay::config::Config;
use termrelay::shutdown::ShutdownCoordinator;
use termrelay::transport::telegram::TelegramApi;

/// Telegram bot that runs configured commands and relays their output live.
#[derive(Debug, Parser)]
#[command(name = "termrelay", version)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let path = cli.config.unwrap_or_else(Config::config_path);
    let config = Config::load_from(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!(path = %path.display(), "Configuration loaded");

    let api = Arc::new(TelegramApi::with_base_url(
        config.bot_token.expose(),
        &config.telegram.api_base_url,
    ));

    let coordinator = ShutdownCoordinator::new();
    let shutdown = coordinator.handle();
    tokio::spawn(async move {
        if let Err(e) = coordinator.wait_for_signal().await {
            tracing::error!(error = %e, "Cannot listen for shutdown signals");
        }
    });

    Bot::new(Arc::clone(&api), api, config).run(shutdown).await;
    Ok(())
}
