//! Bot runner: the long-polling loop
//!
//! Pulls updates from the chat transport, feeds each message through the
//! dispatcher in arrival order and sends back the replies. Transient poll
//! failures back off exponentially; fatal ones (bad token) end the loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::transport::{ChatTransport, TransportError, Update};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Exponential delay between failed polls
#[derive(Debug, Clone)]
struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to wait now; doubles the next one up to the cap
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Drives a [`Dispatcher`] from a [`ChatTransport`]
pub struct BotRunner {
    dispatcher: Dispatcher,
    transport: Arc<dyn ChatTransport>,
    poll_timeout_secs: u64,
    offset: Option<i64>,
    backoff: Backoff,
}

impl BotRunner {
    pub fn new(dispatcher: Dispatcher, transport: Arc<dyn ChatTransport>, poll_timeout_secs: u64) -> Self {
        debug!(poll_timeout_secs, "BotRunner::new: called");
        Self {
            dispatcher,
            transport,
            poll_timeout_secs,
            offset: None,
            backoff: Backoff::new(INITIAL_BACKOFF, MAX_BACKOFF),
        }
    }

    /// Override the retry delays
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff = Backoff::new(initial, max);
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Offset the next poll will ask for
    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Poll until `shutdown` resolves or the transport fails fatally
    pub async fn run<F>(&mut self, shutdown: F) -> Result<(), TransportError>
    where
        F: Future<Output = ()>,
    {
        info!("Bot runner started");
        tokio::pin!(shutdown);

        loop {
            let polled = tokio::select! {
                _ = &mut shutdown => {
                    info!("Bot runner shutting down");
                    return Ok(());
                }
                result = self.poll_once() => result,
            };

            let err = match polled {
                Ok(count) => {
                    debug!(count, "run: poll handled");
                    self.backoff.reset();
                    continue;
                }
                Err(e) => e,
            };

            if err.is_fatal() {
                error!(error = %err, "Fatal transport error, stopping");
                return Err(err);
            }

            let delay = err.retry_after().unwrap_or_else(|| self.backoff.next_delay());
            warn!(error = %err, ?delay, "Polling failed, retrying");

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Bot runner shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Fetch one batch of updates and handle it; returns the number of updates
    pub async fn poll_once(&mut self) -> Result<usize, TransportError> {
        debug!(offset = ?self.offset, "poll_once: called");
        let updates = self.transport.get_updates(self.offset, self.poll_timeout_secs).await?;
        let count = updates.len();
        for update in updates {
            self.handle_update(update).await;
        }
        Ok(count)
    }

    async fn handle_update(&mut self, update: Update) {
        // acknowledge before handling so a failed reply is never redelivered
        self.offset = Some(self.offset.map_or(update.update_id + 1, |o| o.max(update.update_id + 1)));

        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "handle_update: no text message, skipping");
            return;
        };

        let Some(reply) = self.dispatcher.handle(message.chat_id, &message.text).await else {
            return;
        };

        if let Err(e) = self.transport.send_message(message.chat_id, &reply).await {
            warn!(chat_id = message.chat_id, error = %e, "Failed to send reply");
        }
    }
}
