//! Chat transport for the bot
//!
//! Provides the ChatTransport trait and the Telegram Bot API implementation.

mod client;
mod error;
mod telegram;
mod types;

pub use client::ChatTransport;
#[cfg(test)]
pub use client::mock::MockTransport;
pub use error::TransportError;
pub use telegram::{MAX_MESSAGE_CHARS, TelegramClient, split_message};
pub use types::{IncomingMessage, Update};
