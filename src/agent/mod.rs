//! The chat agent: tool-calling conversation loop plus reply streaming.

pub mod conversation;
pub mod stream;

use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::context::AgentContext;
use crate::error::TwinError;
use crate::provider::{ModelProvider, ProviderRequest};
use crate::tools::{Dispatcher, ToolRegistry};
use crate::types::{GenerationSettings, Message, Usage};
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

pub use conversation::{ChatState, Conversation};

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 10;

/// Lazy sequence of growing reply prefixes. An `Err` item ends the turn.
pub type ReplyStream = BoxStream<'static, Result<String, TwinError>>;

/// Loop limits and pacing.
#[derive(Debug, Clone, Builder)]
pub struct AgentSettings {
    /// Tool rounds allowed per turn before the turn fails.
    #[builder(default = DEFAULT_MAX_TOOL_ROUNDS)]
    pub max_tool_rounds: usize,
    /// Timeout for a single model call (per attempt).
    #[builder(default = Duration::from_secs(60))]
    pub request_timeout: Duration,
    /// Timeout for a single tool call.
    #[builder(default = Duration::from_secs(30))]
    pub tool_timeout: Duration,
    /// Pause between streamed prefixes.
    #[builder(default)]
    pub stream_delay: Duration,
    #[builder(default)]
    pub retry: RetryPolicy,
    #[builder(default)]
    pub generation: GenerationSettings,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Result of one completed turn.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub reply: String,
    /// Full message sequence, including the final assistant message.
    pub messages: Vec<Message>,
    pub rounds: usize,
    pub usage: Usage,
    pub state: ChatState,
}

/// Answers visitor messages on behalf of a persona.
///
/// Cheap to clone; all shared parts are immutable.
#[derive(Clone)]
pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    dispatcher: Dispatcher,
    context: Arc<AgentContext>,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        registry: Arc<ToolRegistry>,
        context: AgentContext,
        settings: AgentSettings,
    ) -> Self {
        let dispatcher = Dispatcher::new(registry).with_tool_timeout(settings.tool_timeout);
        Self {
            provider,
            dispatcher,
            context: Arc::new(context),
            settings,
        }
    }

    pub fn context(&self) -> &AgentContext {
        &self.context
    }

    pub fn registry(&self) -> &ToolRegistry {
        self.dispatcher.registry()
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Run one turn to completion.
    pub async fn respond(&self, message: &str, history: &[Message]) -> Result<ChatOutcome, TwinError> {
        self.respond_with_cancel(message, history, CancellationToken::new())
            .await
    }

    /// Run one turn, aborting with [`TwinError::Canceled`] once `cancel` fires.
    pub async fn respond_with_cancel(
        &self,
        message: &str,
        history: &[Message],
        cancel: CancellationToken,
    ) -> Result<ChatOutcome, TwinError> {
        let mut conversation = Conversation::new(
            self.context.system_prompt(),
            history,
            message,
            self.settings.max_tool_rounds,
        );
        let tools = self.dispatcher.registry().declarations();
        let mut usage = Usage::default();

        loop {
            if cancel.is_cancelled() {
                return Err(TwinError::Canceled);
            }
            match conversation.state() {
                ChatState::AwaitingModel => {
                    let request = ProviderRequest {
                        messages: conversation.messages().to_vec(),
                        tools: tools.clone(),
                        settings: self.settings.generation.clone(),
                    };
                    debug!(
                        model = self.provider.model_id(),
                        round = conversation.rounds(),
                        messages = request.messages.len(),
                        "Calling model"
                    );

                    let provider = &self.provider;
                    let request = &request;
                    let timeout = self.settings.request_timeout;
                    let response = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(TwinError::Canceled),
                        response = self
                            .settings
                            .retry
                            .execute(|| with_timeout(timeout, provider.generate(request))) => response?,
                    };

                    usage.merge(&response.usage);
                    conversation.accept_response(response)?;
                }
                ChatState::HandlingTools => {
                    let results = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(TwinError::Canceled),
                        results = self.dispatcher.dispatch(conversation.pending_calls()) => results,
                    };
                    conversation.accept_tool_results(results)?;
                }
                ChatState::Done => break,
            }
        }

        let reply = conversation.reply().unwrap_or_default().to_string();
        let rounds = conversation.rounds();
        info!(
            rounds,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Turn complete"
        );

        Ok(ChatOutcome {
            reply,
            rounds,
            usage,
            state: conversation.state(),
            messages: conversation.into_messages(),
        })
    }

    /// Answer `message` given the prior `history`, as a lazy stream of
    /// growing prefixes of the reply. Nothing runs until the stream is polled.
    pub fn chat(&self, message: impl Into<String>, history: Vec<Message>) -> ReplyStream {
        self.chat_with_cancel(message, history, CancellationToken::new())
    }

    /// [`Agent::chat`] with a cancellation token covering the whole turn.
    pub fn chat_with_cancel(
        &self,
        message: impl Into<String>,
        history: Vec<Message>,
        cancel: CancellationToken,
    ) -> ReplyStream {
        let agent = self.clone();
        let message = message.into();
        let stream = async_stream::stream! {
            let outcome = match agent.respond_with_cancel(&message, &history, cancel.clone()).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let prefixes = stream::prefix_stream(outcome.reply, agent.settings.stream_delay);
            futures::pin_mut!(prefixes);
            while let Some(prefix) = prefixes.next().await {
                if cancel.is_cancelled() {
                    yield Err(TwinError::Canceled);
                    return;
                }
                yield Ok(prefix);
            }
        };
        Box::pin(stream)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("persona", &self.context.persona_name())
            .field("tools", &self.registry().names())
            .field("settings", &self.settings)
            .finish()
    }
}
