//! Streams one chat turn from the completion service to the HTTP client.
//!
//! A [`ChatRelay`] runs in its own task and writes [`RelayEvent`]s into a
//! bounded channel that the HTTP response drains. Fragments are forwarded
//! in arrival order without buffering. Dropping the receiving end cancels
//! the upstream request.

use std::fmt;
use std::sync::Arc;

use area_insights_ai::providers::{ChatTurn, CompletionRequest, LlmProvider, Message};
use futures::StreamExt as _;
use tokio::sync::mpsc;

use crate::config::ChatConfig;

/// Lifecycle of a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Created, nothing sent upstream yet.
    Idle,
    /// Upstream request in flight.
    Streaming,
    /// Upstream completed normally.
    Done,
    /// Upstream failed; a [`RelayEvent::Failed`] was sent.
    Failed,
    /// The client went away before upstream completed.
    Cancelled,
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Streaming => "streaming",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// What the relay sends to the HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A text fragment, forwarded verbatim.
    Fragment(String),
    /// The relay failed. No events follow.
    Failed {
        /// Description of the failure, for logging.
        message: String,
        /// Fragments already delivered before the failure.
        fragments_sent: usize,
    },
}

/// One chat turn to relay.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    /// Instructions for the model.
    pub system_prompt: String,
    /// Context blob built for this turn.
    pub context: String,
    /// Earlier turns, oldest first.
    pub history: Vec<ChatTurn>,
    /// Summary of the conversation so far, if the client has one.
    pub summary: Option<String>,
    /// The new user message.
    pub message: String,
}

/// Drives a single streamed completion.
pub struct ChatRelay {
    provider: Arc<dyn LlmProvider>,
    config: Arc<ChatConfig>,
    state: RelayState,
}

impl ChatRelay {
    /// Creates an idle relay.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: Arc<ChatConfig>) -> Self {
        Self {
            provider,
            config,
            state: RelayState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> RelayState {
        self.state
    }

    /// The ordered message list sent upstream: instructions, context,
    /// summary hint (if any), history, then the new message.
    #[must_use]
    pub fn messages(&self, request: &RelayRequest) -> Vec<Message> {
        let mut messages = Vec::with_capacity(request.history.len() + 4);
        messages.push(Message::system(request.system_prompt.trim()));
        messages.push(Message::user(request.context.clone()));
        if let Some(hint) = self.config.summary_message(request.summary.as_deref()) {
            messages.push(Message::system(hint));
        }
        messages.extend(request.history.iter().map(Message::from));
        messages.push(Message::user(request.message.clone()));
        messages
    }

    /// Streams the completion for `request` into `tx` and returns the
    /// final state.
    pub async fn run(&mut self, request: RelayRequest, tx: mpsc::Sender<RelayEvent>) -> RelayState {
        let completion = CompletionRequest {
            messages: self.messages(&request),
            max_tokens: self.config.max_tokens,
        };
        let provider = Arc::clone(&self.provider);

        self.transition(RelayState::Streaming);

        let opened = tokio::select! {
            () = tx.closed() => None,
            opened = provider.stream(&completion) => Some(opened),
        };
        let mut stream = match opened {
            None => return self.transition(RelayState::Cancelled),
            Some(Ok(stream)) => stream,
            Some(Err(e)) => return self.fail(&tx, e.to_string(), 0).await,
        };

        let mut fragments_sent = 0;
        loop {
            let next = tokio::select! {
                () = tx.closed() => return self.transition(RelayState::Cancelled),
                next = stream.next() => next,
            };

            match next {
                Some(Ok(fragment)) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    if tx.send(RelayEvent::Fragment(fragment)).await.is_err() {
                        return self.transition(RelayState::Cancelled);
                    }
                    fragments_sent += 1;
                }
                Some(Err(e)) => return self.fail(&tx, e.to_string(), fragments_sent).await,
                None => {
                    log::debug!("Relay delivered {fragments_sent} fragments");
                    return self.transition(RelayState::Done);
                }
            }
        }
    }

    async fn fail(
        &mut self,
        tx: &mpsc::Sender<RelayEvent>,
        message: String,
        fragments_sent: usize,
    ) -> RelayState {
        log::error!("Chat relay failed after {fragments_sent} fragments: {message}");
        // The receiver may already be gone; nothing else to report then.
        let _ = tx
            .send(RelayEvent::Failed {
                message,
                fragments_sent,
            })
            .await;
        self.transition(RelayState::Failed)
    }

    fn transition(&mut self, next: RelayState) -> RelayState {
        log::debug!("Chat relay {} -> {next}", self.state);
        self.state = next;
        next
    }
}
