//! Outbound alert delivery.

#[cfg(test)]
pub mod mock;
pub mod telegram;

pub use telegram::TelegramNotifier;

use anyhow::Result;
use async_trait::async_trait;

/// A destination for alert text
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text`. Unconfigured notifiers return `Ok(())` without sending.
    async fn send(&self, text: &str) -> Result<()>;

    /// Whether credentials for the destination are present
    fn is_configured(&self) -> bool;
}
