//! ChatTransport trait definition

use async_trait::async_trait;
#[allow(unused_imports)]
use tracing::debug;

use super::{TransportError, Update};
use crate::dispatcher::ChatId;

/// Inbound/outbound chat plumbing
///
/// Long polling: `get_updates` blocks up to `timeout_secs` waiting for new
/// updates with `update_id >= offset`.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Fetch pending updates starting at `offset`
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>, TransportError>;

    /// Send a text reply to a conversation
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError>;
}
