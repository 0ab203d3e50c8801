use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, Recipient};
use tracing::{debug, info};

use super::Notifier;
use crate::config::TelegramConfig;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends alerts to a single Telegram chat through the Bot API
pub struct TelegramNotifier {
    bot: Bot,
    /// `None` when the token or chat id is missing
    recipient: Option<Recipient>,
}

/// Numeric ids address chats/groups directly; anything else is a channel username.
fn parse_recipient(chat_id: &str) -> Recipient {
    match chat_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(chat_id.to_string()),
    }
}

fn no_link_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(SEND_TIMEOUT)
            .build()
            .context("Failed to build Telegram HTTP client")?;
        let bot = Bot::with_client(&config.bot_token, client);

        let recipient = if config.bot_token.is_empty() || config.chat_id.is_empty() {
            None
        } else {
            Some(parse_recipient(&config.chat_id))
        };

        Ok(Self { bot, recipient })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let Some(recipient) = &self.recipient else {
            debug!("Telegram not configured, dropping alert");
            return Ok(());
        };

        self.bot
            .send_message(recipient.clone(), text)
            .link_preview_options(no_link_preview())
            .await
            .context("Failed to send Telegram message")?;

        info!("Telegram alert sent");
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.recipient.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: &str, chat: &str) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.to_string(),
            chat_id: chat.to_string(),
        }
    }

    #[test]
    fn test_parse_numeric_recipient() {
        assert_eq!(
            parse_recipient("-1001234567890"),
            Recipient::Id(ChatId(-1001234567890))
        );
    }

    #[test]
    fn test_parse_channel_recipient() {
        assert_eq!(
            parse_recipient("@support_alerts"),
            Recipient::ChannelUsername("@support_alerts".to_string())
        );
    }

    #[test]
    fn test_not_configured_without_token() {
        let notifier = TelegramNotifier::new(&config("", "123")).unwrap();
        assert!(!notifier.is_configured());
    }

    #[test]
    fn test_not_configured_without_chat() {
        let notifier = TelegramNotifier::new(&config("token", "")).unwrap();
        assert!(!notifier.is_configured());
    }

    #[test]
    fn test_configured() {
        let notifier = TelegramNotifier::new(&config("token", "123")).unwrap();
        assert!(notifier.is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_send_is_noop() {
        let notifier = TelegramNotifier::new(&config("", "")).unwrap();
        assert!(notifier.send("hello").await.is_ok());
    }
}
