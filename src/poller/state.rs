use std::collections::{HashMap, HashSet};

use super::livechat::ChatSummary;
use crate::alert::{self, Alert};

/// What the poller has already seen. Owned by the poll task; lives only for the
/// process lifetime and is never pruned.
#[derive(Debug, Default)]
pub struct PollerState {
    seen_chats: HashSet<String>,
    last_message_ids: HashMap<String, String>,
}

impl PollerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen_count(&self) -> usize {
        self.seen_chats.len()
    }

    pub fn last_message_id(&self, chat_id: &str) -> Option<&str> {
        self.last_message_ids.get(chat_id).map(String::as_str)
    }

    /// Record one poll result and return the alerts it produces, in order.
    ///
    /// A chat seen for the first time yields `NewChat`; a last message id that
    /// differs from the stored one (or has none stored yet) yields `NewMessage`.
    /// Both can fire for the same chat in one call.
    pub fn observe(&mut self, chats: &[ChatSummary]) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for chat in chats {
            let preview = chat.last_message_text.as_deref().and_then(alert::preview);

            if self.seen_chats.insert(chat.id.clone()) {
                alerts.push(Alert::NewChat {
                    chat_id: chat.id.clone(),
                    customer: chat.customer.clone(),
                    preview: preview.clone(),
                });
            }

            let Some(message_id) = chat.last_message_id.as_deref() else {
                continue;
            };
            if self.last_message_id(&chat.id) != Some(message_id) {
                self.last_message_ids
                    .insert(chat.id.clone(), message_id.to_string());
                alerts.push(Alert::NewMessage {
                    chat_id: chat.id.clone(),
                    preview,
                });
            }
        }

        alerts
    }
}
