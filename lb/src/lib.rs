//! LessonBot - lesson plans over Telegram
//!
//! Teachers add plan entries through a short chat dialog (`/add`) and look
//! them up by date and class (`/plan`). Entries live in a Google Sheet through
//! [`planstore`].
//!
//! # Modules
//!
//! - [`dispatcher`] - command routing and per-conversation sessions
//! - [`wizard`] - the add dialog state machine
//! - [`query`] - `/plan` filtering and formatting
//! - [`date`] - date normalisation
//! - [`transport`] - ChatTransport trait and Telegram client
//! - [`runner`] - long-polling loop
//! - [`keepalive`] - liveness HTTP endpoint
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod date;
pub mod dispatcher;
pub mod keepalive;
pub mod messages;
pub mod query;
pub mod runner;
pub mod transport;
pub mod wizard;

// Re-export commonly used types
pub use config::{Config, KeepaliveConfig, SheetsConfig, StoreBackend, TelegramConfig};
pub use dispatcher::{ChatId, Command, Dispatcher};
pub use query::PlanQuery;
pub use runner::BotRunner;
pub use transport::{ChatTransport, TelegramClient, TransportError, Update};
pub use wizard::{Step, WizardSession, WizardState};
