//! Telegram Bot API client
//!
//! Implements ChatTransport with `getUpdates` long polling and `sendMessage`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ChatTransport, TransportError, Update};
use crate::config::ResolvedTelegramConfig;
use crate::dispatcher::ChatId;

/// Telegram rejects messages longer than this many UTF-16 code units
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Standard Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TgUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    chat: TgChat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    #[serde(default)]
    username: Option<String>,
}

impl From<TgUpdate> for Update {
    fn from(update: TgUpdate) -> Self {
        let message = update.message.and_then(|m| {
            m.text.map(|text| super::IncomingMessage {
                chat_id: m.chat.id,
                text,
            })
        });
        Update {
            update_id: update.update_id,
            message,
        }
    }
}

/// Telegram Bot API client
pub struct TelegramClient {
    token: String,
    api_url: String,
    http: Client,
    timeout: Duration,
}

impl TelegramClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedTelegramConfig) -> Result<Self, TransportError> {
        debug!(api_url = %config.api_url, "from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);
        // per-request timeouts are set in call(); long polls need more than `timeout`
        let http = Client::builder().build().map_err(TransportError::Network)?;

        Ok(Self {
            token: config.token.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    /// The bot's own username, from `getMe`
    pub async fn get_me(&self) -> Result<Option<String>, TransportError> {
        debug!("get_me: called");
        let me: TgUser = self.call("getMe", serde_json::json!({}), self.timeout).await?;
        Ok(me.username)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
        timeout: Duration,
    ) -> Result<T, TransportError> {
        debug!(%method, "call: called");
        let response = self
            .http
            .post(self.method_url(method))
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| TransportError::Network(e.without_url()))?;
        let envelope: ApiResponse<T> = serde_json::from_str(&text)
            .map_err(|e| TransportError::InvalidResponse(format!("HTTP {}: {}", status, e)))?;

        parse_envelope(envelope, status)
    }
}

fn parse_envelope<T>(envelope: ApiResponse<T>, status: u16) -> Result<T, TransportError> {
    if envelope.ok {
        return envelope
            .result
            .ok_or_else(|| TransportError::InvalidResponse("ok response without result".to_string()));
    }

    if let Some(retry_after) = envelope.parameters.and_then(|p| p.retry_after) {
        debug!(retry_after, "parse_envelope: rate limited");
        return Err(TransportError::RateLimited {
            retry_after: Duration::from_secs(retry_after),
        });
    }

    Err(TransportError::ApiError {
        code: envelope.error_code.unwrap_or(status),
        description: envelope.description.unwrap_or_default(),
    })
}

/// Length as Telegram counts it (UTF-16 code units)
fn text_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Cut a paragraph longer than `limit` at character boundaries
fn hard_cut(paragraph: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_len = 0;
    for c in paragraph.chars() {
        let c_len = c.len_utf16();
        if piece_len + c_len > limit && !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
            piece_len = 0;
        }
        piece.push(c);
        piece_len += c_len;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Split a reply into chunks Telegram accepts, preferring paragraph breaks
///
/// `limit` is in UTF-16 code units, the unit of Telegram's message limit.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text_len(text) <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for paragraph in text.split("\n\n") {
        let paragraph_len = text_len(paragraph);
        let separator = if current.is_empty() { 0 } else { 2 };

        if current_len + separator + paragraph_len <= limit {
            if separator > 0 {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
            current_len += separator + paragraph_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if paragraph_len <= limit {
            current.push_str(paragraph);
            current_len = paragraph_len;
        } else {
            chunks.extend(hard_cut(paragraph, limit));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>, TransportError> {
        debug!(?offset, timeout_secs, "get_updates: called");
        let mut body = serde_json::json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = serde_json::json!(offset);
        }

        let updates: Vec<TgUpdate> = self
            .call("getUpdates", body, self.timeout + Duration::from_secs(timeout_secs))
            .await?;
        debug!(count = updates.len(), "get_updates: received");
        Ok(updates.into_iter().map(Update::from).collect())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        debug!(chat_id, len = text.len(), "send_message: called");
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            let _: serde_json::Value = self.call("sendMessage", body, self.timeout).await?;
        }
        Ok(())
    }
}
