//! Transport-neutral update types

use crate::dispatcher::ChatId;

/// One polled update
///
/// Every update advances the poll offset, even the ones that carry nothing
/// the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

/// A text message from a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub text: String,
}

impl Update {
    pub fn text(update_id: i64, chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            update_id,
            message: Some(IncomingMessage {
                chat_id,
                text: text.into(),
            }),
        }
    }

    pub fn empty(update_id: i64) -> Self {
        Self {
            update_id,
            message: None,
        }
    }
}
