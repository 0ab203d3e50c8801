pub mod livechat;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::alert::Alert;
use crate::notifier::Notifier;
pub use livechat::{ChatSummary, LiveChatClient};
pub use state::PollerState;

/// Anything that can list the currently active chats
#[async_trait]
pub trait ChatSource: Send + Sync {
    async fn list_chats(&self) -> Result<Vec<ChatSummary>>;
}

/// Short, secret-free description of what went wrong in a poll tick.
pub fn error_kind(err: &anyhow::Error) -> String {
    // teloxide keeps its reqwest error behind its own wrapper, so check it first.
    if let Some(telegram) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<teloxide::RequestError>())
    {
        return match telegram {
            teloxide::RequestError::Network(_) => "telegram_network",
            teloxide::RequestError::Api(_) => "telegram_api",
            teloxide::RequestError::RetryAfter(_) => "telegram_rate_limited",
            _ => "telegram_request",
        }
        .to_string();
    }

    let Some(http) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<reqwest::Error>())
    else {
        return "other".to_string();
    };

    if let Some(status) = http.status() {
        format!("http_status_{}", status.as_u16())
    } else if http.is_timeout() {
        "timeout".to_string()
    } else if http.is_connect() {
        "connect".to_string()
    } else if http.is_decode() {
        "decode".to_string()
    } else {
        "request".to_string()
    }
}

/// Periodically lists active chats and alerts on new chats and new messages
pub struct Poller {
    source: Box<dyn ChatSource>,
    notifier: Arc<dyn Notifier>,
    state: PollerState,
    interval: Duration,
}

impl Poller {
    pub fn new(
        source: Box<dyn ChatSource>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            notifier,
            state: PollerState::new(),
            interval,
        }
    }

    /// One list-and-diff cycle. Returns the number of alerts sent; a failed
    /// send aborts the remaining alerts of this tick.
    pub async fn tick(&mut self) -> Result<usize> {
        let chats = self.source.list_chats().await?;
        let alerts = self.state.observe(&chats);
        debug!(
            "{} active chat(s), {} tracked in total",
            chats.len(),
            self.state.seen_count()
        );

        for alert in &alerts {
            debug!("Sending poller alert for chat {:?}", alert.chat_id());
            self.notifier.send(&alert.format_message()).await?;
        }

        Ok(alerts.len())
    }

    /// Run a tick and, if it fails, report the failure kind once.
    pub async fn poll_once(&mut self) {
        match self.tick().await {
            Ok(0) => {}
            Ok(sent) => info!("Poll tick sent {} alert(s)", sent),
            Err(e) => {
                let kind = error_kind(&e);
                warn!("Poll tick failed ({}): {:#}", kind, e);

                let alert = Alert::PollFailed { kind };
                if let Err(e) = self.notifier.send(&alert.format_message()).await {
                    warn!("Failed to report poll failure: {:#}", e);
                }
            }
        }
    }

    /// Poll forever, sleeping the configured interval after every tick.
    pub async fn run(mut self) {
        info!("Chat poller running every {}s", self.interval.as_secs());
        loop {
            self.poll_once().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
