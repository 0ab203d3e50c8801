mod alert;
mod config;
mod notifier;
mod poller;
mod server;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::notifier::{Notifier, TelegramNotifier};
use crate::poller::{LiveChatClient, Poller};
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,livechat_telegram_alert=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional config file; environment variables override it
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded");
    info!("  Telegram alerts: {}", config.telegram_configured());
    info!("  Polling: {}", config.polling_configured());
    info!("  Poll interval: {}s", config.livechat.poll_interval_secs);
    info!("  Group filter: {:?}", config.livechat.group_ids);
    if config.livechat.webhook_key.is_empty() {
        warn!("LIVECHAT_WEBHOOK_KEY is not set, every webhook call will be rejected");
    }
    if !config.telegram_configured() {
        warn!("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID missing, alerts will not be sent");
    }

    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(&config.telegram)?);

    // The poller owns its state; nothing else touches it.
    let poller_task = if config.polling_configured() {
        let client = LiveChatClient::new(&config.livechat)?;
        let poller = Poller::new(Box::new(client), notifier.clone(), config.poll_interval());
        Some(poller.spawn())
    } else {
        info!("LiveChat credentials missing, chat poller disabled");
        None
    };

    let state = AppState::new(
        notifier,
        &config.livechat.webhook_key,
        poller_task.is_some(),
    );
    let app = server::router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    if let Some(task) = poller_task {
        task.abort();
    }

    Ok(())
}
