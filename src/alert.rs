//! Alert messages relayed to Telegram

/// Maximum number of characters kept in a message preview.
pub const PREVIEW_MAX_CHARS: usize = 120;

/// Where staff go to answer a chat.
pub const LIVECHAT_APP_URL: &str = "https://my.livechatinc.com/";

/// Trim `text` and cut it to [`PREVIEW_MAX_CHARS`] characters, appending `...`
/// when something was cut. Blank text has no preview.
pub fn preview(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Count chars, not bytes, so multi-byte text never splits mid-character.
    match trimmed.char_indices().nth(PREVIEW_MAX_CHARS) {
        Some((cut, _)) => Some(format!("{}...", &trimmed[..cut])),
        None => Some(trimmed.to_string()),
    }
}

/// Something staff should be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// An event pushed to the webhook
    Webhook {
        event_type: String,
        chat_id: String,
        preview: Option<String>,
    },

    /// The poller saw a chat id for the first time
    NewChat {
        chat_id: String,
        customer: Option<String>,
        preview: Option<String>,
    },

    /// The last message of a chat changed between polls
    NewMessage {
        chat_id: String,
        preview: Option<String>,
    },

    /// A poll tick failed; only the error kind is reported
    PollFailed { kind: String },
}

impl Alert {
    pub fn chat_id(&self) -> Option<&str> {
        match self {
            Alert::Webhook { chat_id, .. }
            | Alert::NewChat { chat_id, .. }
            | Alert::NewMessage { chat_id, .. } => Some(chat_id),
            Alert::PollFailed { .. } => None,
        }
    }

    /// Render the alert as the plain text sent to Telegram
    pub fn format_message(&self) -> String {
        match self {
            Alert::Webhook {
                event_type,
                chat_id,
                preview,
            } => format!(
                "\u{1F4E9} LiveChat 메시지 도착\n- type: {}\n- chat_id: {}\n{}\u{1F449} 답변하러 가기: {}",
                event_type,
                chat_id,
                preview_line(preview),
                LIVECHAT_APP_URL
            ),
            Alert::NewChat {
                chat_id,
                customer,
                preview,
            } => {
                let customer_line = customer
                    .as_ref()
                    .map(|name| format!("- customer: {}\n", name))
                    .unwrap_or_default();
                format!(
                    "\u{1F195} 새 LiveChat 채팅\n- chat_id: {}\n{}{}\u{1F449} 답변하러 가기: {}",
                    chat_id,
                    customer_line,
                    preview_line(preview),
                    LIVECHAT_APP_URL
                )
            }
            Alert::NewMessage { chat_id, preview } => format!(
                "\u{1F4AC} LiveChat 새 메시지\n- chat_id: {}\n{}\u{1F449} 답변하러 가기: {}",
                chat_id,
                preview_line(preview),
                LIVECHAT_APP_URL
            ),
            Alert::PollFailed { kind } => {
                format!("\u{26A0}\u{FE0F} LiveChat 폴링 오류: {}", kind)
            }
        }
    }
}

fn preview_line(preview: &Option<String>) -> String {
    preview
        .as_ref()
        .map(|p| format!("- preview: {}\n", p))
        .unwrap_or_default()
}
