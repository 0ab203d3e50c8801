use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ChatSource;
use crate::config::LiveChatConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const PAGE_LIMIT: u32 = 100;
/// Guards against a server that keeps handing out page ids.
const MAX_PAGES: usize = 50;

/// One active chat as reported by `list_chats`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    pub id: String,
    pub customer: Option<String>,
    pub last_message_id: Option<String>,
    pub last_message_text: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListChatsRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<ListChatsFilters<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ListChatsFilters<'a> {
    group_ids: &'a [u32],
}

#[derive(Debug, Deserialize)]
struct ListChatsResponse {
    #[serde(default)]
    chats_summary: Vec<RawChatSummary>,
    #[serde(default)]
    next_page_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChatSummary {
    id: String,
    #[serde(default)]
    users: Vec<RawUser>,
    #[serde(default)]
    last_event_per_type: HashMap<String, RawLastEvent>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(rename = "type", default)]
    user_type: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLastEvent {
    #[serde(default)]
    event: RawEvent,
}

#[derive(Debug, Default, Deserialize)]
struct RawEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl From<RawChatSummary> for ChatSummary {
    fn from(raw: RawChatSummary) -> Self {
        let customer = raw
            .users
            .into_iter()
            .find(|u| u.user_type == "customer")
            .and_then(|u| u.name)
            .filter(|name| !name.trim().is_empty());

        let (last_message_id, last_message_text) = raw
            .last_event_per_type
            .get("message")
            .map(|last| (last.event.id.clone(), last.event.text.clone()))
            .unwrap_or_default();

        Self {
            id: raw.id,
            customer,
            last_message_id,
            last_message_text,
        }
    }
}

/// Client for the LiveChat Agent Chat API
pub struct LiveChatClient {
    client: reqwest::Client,
    api_url: String,
    account_id: String,
    access_token: String,
    group_ids: Vec<u32>,
}

impl LiveChatClient {
    pub fn new(config: &LiveChatConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build LiveChat HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            account_id: config.account_id.clone(),
            access_token: config.access_token.clone(),
            group_ids: config.group_ids.clone(),
        })
    }

    fn list_chats_url(&self) -> String {
        format!("{}/agent/action/list_chats", self.api_url)
    }

    /// The first page carries filters; follow-up pages only name the page.
    fn page_request<'a>(&'a self, page_id: Option<&'a str>) -> ListChatsRequest<'a> {
        match page_id {
            None => ListChatsRequest {
                limit: Some(PAGE_LIMIT),
                filters: (!self.group_ids.is_empty()).then(|| ListChatsFilters {
                    group_ids: &self.group_ids,
                }),
                page_id: None,
            },
            Some(page_id) => ListChatsRequest {
                limit: None,
                filters: None,
                page_id: Some(page_id),
            },
        }
    }

    async fn fetch_page(&self, page_id: Option<&str>) -> Result<ListChatsResponse> {
        let url = self.list_chats_url();
        debug!("Listing LiveChat chats: {} (page {:?})", url, page_id);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_id, Some(&self.access_token))
            .json(&self.page_request(page_id))
            .send()
            .await
            .context("Failed to send request to LiveChat")?
            .error_for_status()
            .context("LiveChat API returned an error status")?;

        response
            .json()
            .await
            .context("Failed to parse LiveChat list_chats response")
    }
}

#[async_trait]
impl ChatSource for LiveChatClient {
    async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let mut chats = Vec::new();
        let mut page_id: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self.fetch_page(page_id.as_deref()).await?;
            chats.extend(page.chats_summary.into_iter().map(ChatSummary::from));

            match page.next_page_id.filter(|id| !id.is_empty()) {
                Some(next) => page_id = Some(next),
                None => break,
            }
        }

        debug!("LiveChat reported {} active chat(s)", chats.len());
        Ok(chats)
    }
}
