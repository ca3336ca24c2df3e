//! Per-turn conversation state machine.
//!
//! `AwaitingModel` → (tool request) → `HandlingTools` → `AwaitingModel` …
//! → (final message) → `Done`. The conversation owns the message sequence
//! for the duration of a single turn.

use strum::Display;
use tracing::debug;

use crate::error::TwinError;
use crate::provider::ProviderResponse;
use crate::types::{Message, Role, ToolCallRequest, ToolResult};

/// Where a turn currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ChatState {
    AwaitingModel,
    HandlingTools,
    Done,
}

/// Message sequence and loop state for one turn.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    state: ChatState,
    rounds: usize,
    max_rounds: usize,
}

impl Conversation {
    /// Start a turn: `[system] + history + [user]`.
    ///
    /// Only user and assistant turns are taken from the caller's history, and
    /// their tool calls are stripped since the matching results are not part
    /// of it.
    pub fn new(system_prompt: String, history: &[Message], user_message: impl Into<String>, max_rounds: usize) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_prompt));
        for turn in history {
            match turn.role {
                Role::User => messages.push(Message::user(turn.text_content())),
                Role::Assistant => messages.push(Message::assistant(turn.text_content())),
                other => debug!(role = ?other, "Ignoring history message"),
            }
        }
        messages.push(Message::user(user_message));

        Self {
            messages,
            state: ChatState::AwaitingModel,
            rounds: 0,
            max_rounds,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    /// Completed tool rounds.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Tool calls waiting to be dispatched (empty unless `HandlingTools`).
    pub fn pending_calls(&self) -> &[ToolCallRequest] {
        match (self.state, self.messages.last()) {
            (ChatState::HandlingTools, Some(last)) => &last.tool_calls,
            _ => &[],
        }
    }

    /// Final reply text once `Done`.
    pub fn reply(&self) -> Option<&str> {
        match (self.state, self.messages.last()) {
            (ChatState::Done, Some(last)) => Some(last.text_content()),
            _ => None,
        }
    }

    /// Apply the model's response. Valid only in `AwaitingModel`.
    pub fn accept_response(&mut self, response: ProviderResponse) -> Result<(), TwinError> {
        if self.state != ChatState::AwaitingModel {
            return Err(self.unexpected("model response"));
        }

        let requests_tools = response.requests_tools();
        let mut message = response.message;
        message.role = Role::Assistant;

        if requests_tools {
            if self.rounds >= self.max_rounds {
                return Err(TwinError::ToolRoundLimit {
                    max_rounds: self.max_rounds,
                });
            }
            debug!(calls = message.tool_calls.len(), round = self.rounds + 1, "Model requested tools");
            self.messages.push(message);
            self.state = ChatState::HandlingTools;
        } else {
            message.tool_calls.clear();
            self.messages.push(message);
            self.state = ChatState::Done;
        }
        Ok(())
    }

    /// Append dispatched results in request order. Valid only in `HandlingTools`.
    pub fn accept_tool_results(&mut self, results: Vec<ToolResult>) -> Result<(), TwinError> {
        if self.state != ChatState::HandlingTools {
            return Err(self.unexpected("tool results"));
        }
        let expected: Vec<&str> = self.pending_calls().iter().map(|c| c.id.as_str()).collect();
        let actual: Vec<&str> = results.iter().map(|r| r.tool_call_id.as_str()).collect();
        if expected != actual {
            return Err(TwinError::InvalidState(format!(
                "tool results {actual:?} do not answer calls {expected:?}"
            )));
        }

        self.messages.extend(results.into_iter().map(ToolResult::into_message));
        self.rounds += 1;
        self.state = ChatState::AwaitingModel;
        Ok(())
    }

    fn unexpected(&self, what: &str) -> TwinError {
        TwinError::InvalidState(format!("unexpected {what} in state {}", self.state))
    }
}
