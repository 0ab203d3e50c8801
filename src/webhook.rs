//! Field extraction for LiveChat webhook payloads.
//!
//! The payload shape depends on the webhook version and event, so every field
//! is looked up in a list of candidate locations and the first one holding a
//! meaningful value wins.

use serde_json::Value;

use crate::alert::{self, Alert};

const EVENT_TYPE_PATHS: &[&str] = &["/action", "/event", "/type"];
const CHAT_ID_PATHS: &[&str] = &["/chat_id", "/payload/chat_id", "/data/chat_id"];
const TEXT_PATHS: &[&str] = &[
    "/text",
    "/payload/event/text",
    "/payload/text",
    "/data/event/text",
];

/// The parts of a webhook delivery that end up in an alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub event_type: String,
    pub chat_id: Option<String>,
    pub text: Option<String>,
}

/// Null, false, zero and empty strings/collections do not count as a value.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn first_present<'a>(payload: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| payload.pointer(path))
        .find(|value| is_present(value))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl WebhookEvent {
    pub fn from_payload(payload: &Value) -> Self {
        let event_type = first_present(payload, EVENT_TYPE_PATHS)
            .map(render)
            .unwrap_or_else(|| "unknown".to_string());
        let chat_id = first_present(payload, CHAT_ID_PATHS).map(render);
        // Only string text can be previewed.
        let text = first_present(payload, TEXT_PATHS)
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            event_type,
            chat_id,
            text,
        }
    }

    /// Parse a raw request body. Anything that is not a JSON object is treated
    /// as an empty payload.
    pub fn from_body(body: &[u8]) -> Self {
        let payload = serde_json::from_slice::<Value>(body)
            .ok()
            .filter(Value::is_object)
            .unwrap_or_else(|| Value::Object(Default::default()));
        Self::from_payload(&payload)
    }

    pub fn to_alert(&self) -> Alert {
        Alert::Webhook {
            event_type: self.event_type.clone(),
            chat_id: self
                .chat_id
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            preview: self.text.as_deref().and_then(alert::preview),
        }
    }
}
