use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::notifier::Notifier;
use crate::webhook::WebhookEvent;

pub const SERVICE_NAME: &str = "livechat-telegram-alert";

#[derive(Clone)]
pub struct AppState {
    notifier: Arc<dyn Notifier>,
    webhook_key: Arc<str>,
    polling: bool,
}

impl AppState {
    pub fn new(notifier: Arc<dyn Notifier>, webhook_key: &str, polling: bool) -> Self {
        Self {
            notifier,
            webhook_key: Arc::from(webhook_key),
            polling,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
    polling: bool,
}

#[derive(Serialize)]
struct WebhookResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<String>,
}

/// The first `key` wins when the parameter is repeated.
fn first_key(pairs: &[(String, String)]) -> Option<&str> {
    pairs
        .iter()
        .find(|(name, _)| name == "key")
        .map(|(_, value)| value.as_str())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/livechat/webhook", post(livechat_webhook))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: SERVICE_NAME,
        polling: state.polling,
    })
}

async fn livechat_webhook(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, StatusCode> {
    // An unset key rejects everything rather than accepting `?key=`.
    let authorized = !state.webhook_key.is_empty()
        && query
            .as_ref()
            .ok()
            .and_then(|Query(pairs)| first_key(pairs))
            == Some(&*state.webhook_key);
    if !authorized {
        warn!("Rejected webhook call with missing or wrong key");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let event = WebhookEvent::from_body(&body);
    info!(
        "Webhook event {} for chat {:?}",
        event.event_type, event.chat_id
    );
    let msg = event.to_alert().format_message();

    if !state.notifier.is_configured() {
        return Ok(Json(WebhookResponse {
            ok: true,
            warning: Some("Missing TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID"),
            msg: Some(msg),
        }));
    }

    state.notifier.send(&msg).await.map_err(|e| {
        error!("Failed to relay webhook alert: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(WebhookResponse {
        ok: true,
        warning: None,
        msg: None,
    }))
}
