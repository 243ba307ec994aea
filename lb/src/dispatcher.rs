//! Command dispatcher
//!
//! Routes each inbound chat message to a command handler or, for plain text,
//! to the conversation's add wizard. Owns the per-conversation sessions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use planstore::RowStore;
use tracing::{debug, info, warn};

use crate::messages;
use crate::query::{self, PlanQuery};
use crate::wizard::{Step, WizardSession};

/// Conversation identity (the Telegram chat id)
pub type ChatId = i64;

/// Source of the current local time
pub type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// A recognised slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Add,
    Plan(Vec<String>),
    Cancel,
    Unknown(String),
}

impl Command {
    /// Parse a message as a command; `None` for plain text
    ///
    /// Accepts the `/name@BotName` form used in group chats without checking
    /// the bot name. Use [`Command::parse_for`] when the bot's username is known.
    pub fn parse(text: &str) -> Option<Self> {
        Self::parse_for(text, None)
    }

    /// Parse a message as a command addressed to `username`
    ///
    /// A command addressed to a different bot (`/plan@OtherBot`) parses as
    /// [`Command::Unknown`], so it is neither answered nor taken as input.
    pub fn parse_for(text: &str, username: Option<&str>) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next()?.strip_prefix('/')?;
        let (name, target) = match head.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (head, None),
        };
        let name = name.to_lowercase();

        if let (Some(target), Some(me)) = (target, username)
            && !target.eq_ignore_ascii_case(me.trim_start_matches('@'))
        {
            return Some(Command::Unknown(format!("{}@{}", name, target)));
        }

        let args: Vec<String> = tokens.map(str::to_string).collect();

        let command = match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "add" => Command::Add,
            "plan" => Command::Plan(args),
            "cancel" => Command::Cancel,
            _ => Command::Unknown(name),
        };
        Some(command)
    }
}

/// Maps inbound messages to replies
pub struct Dispatcher {
    store: Arc<dyn RowStore>,
    sessions: HashMap<ChatId, WizardSession>,
    clock: Clock,
    username: Option<String>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self::with_clock(store, Box::new(|| Local::now().naive_local()))
    }

    /// Create a dispatcher with a custom clock
    pub fn with_clock(store: Arc<dyn RowStore>, clock: Clock) -> Self {
        debug!("Dispatcher::with_clock: called");
        Self {
            store,
            sessions: HashMap::new(),
            clock,
            username: None,
        }
    }

    /// Only answer `/cmd@name` commands addressed to this bot username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Active wizard session of a conversation
    pub fn session(&self, chat_id: ChatId) -> Option<&WizardSession> {
        self.sessions.get(&chat_id)
    }

    /// Number of conversations with an active wizard
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Handle one inbound message; returns the reply to send, if any
    pub async fn handle(&mut self, chat_id: ChatId, text: &str) -> Option<String> {
        debug!(chat_id, "handle: called");
        match Command::parse_for(text, self.username.as_deref()) {
            Some(Command::Start) | Some(Command::Help) => Some(messages::USAGE.to_string()),
            Some(Command::Add) => self.start_wizard(chat_id),
            Some(Command::Plan(args)) => {
                let query = PlanQuery::from_args(args.as_slice(), (self.clock)().date());
                Some(query::run(self.store.as_ref(), &query).await)
            }
            Some(Command::Cancel) => self.cancel(chat_id),
            Some(Command::Unknown(name)) => {
                debug!(chat_id, %name, "handle: ignoring unknown command");
                None
            }
            None => self.wizard_reply(chat_id, text).await,
        }
    }

    fn start_wizard(&mut self, chat_id: ChatId) -> Option<String> {
        if self.sessions.contains_key(&chat_id) {
            debug!(chat_id, "start_wizard: session already active, ignoring");
            return None;
        }
        self.sessions.insert(chat_id, WizardSession::new());
        info!(chat_id, "Started add wizard");
        Some(WizardSession::prompt().to_string())
    }

    fn cancel(&mut self, chat_id: ChatId) -> Option<String> {
        match self.sessions.remove(&chat_id) {
            Some(session) => {
                info!(chat_id, state = ?session.state(), "Cancelled add wizard");
                Some(messages::CANCELLED.to_string())
            }
            None => {
                debug!(chat_id, "cancel: no active session");
                None
            }
        }
    }

    async fn wizard_reply(&mut self, chat_id: ChatId, text: &str) -> Option<String> {
        let now = (self.clock)();
        let Some(session) = self.sessions.get_mut(&chat_id) else {
            debug!(chat_id, "wizard_reply: no active session, ignoring text");
            return None;
        };

        match session.advance(text, now) {
            Step::Reprompt(prompt) | Step::Advanced(prompt) => Some(prompt.to_string()),
            Step::Complete(entry) => match self.store.append(&entry).await {
                Ok(()) => {
                    self.sessions.remove(&chat_id);
                    info!(chat_id, date = %entry.date(), class = %entry.class(), "Saved plan entry");
                    Some(messages::SAVED.to_string())
                }
                Err(e) => {
                    // session stays in AwaitingNote so the note can be resent
                    warn!(chat_id, error = %e, "Failed to append plan entry");
                    Some(messages::save_failed(&e))
                }
            },
        }
    }
}
