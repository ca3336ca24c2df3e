//! Model provider trait and the OpenAI-compatible implementation.

pub mod http;
pub mod openai;

use async_trait::async_trait;

use crate::error::TwinError;
use crate::tools::ToolDeclaration;
use crate::types::{FinishReason, GenerationSettings, Message, Usage};

pub use openai::OpenAiCompatibleProvider;

/// A request sent to a model provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDeclaration>,
    pub settings: GenerationSettings,
}

/// Response from a provider: one assistant message plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub message: Message,
    pub finish_reason: Option<FinishReason>,
    pub usage: Usage,
}

impl ProviderResponse {
    /// Final assistant reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(text),
            finish_reason: Some(FinishReason::Stop),
            usage: Usage::default(),
        }
    }

    /// Assistant message requesting tool calls.
    pub fn tool_calls(calls: Vec<crate::types::ToolCallRequest>) -> Self {
        Self {
            message: Message::assistant_with_tool_calls(None, calls),
            finish_reason: Some(FinishReason::ToolCalls),
            usage: Usage::default(),
        }
    }

    /// Whether the model is asking for tools to be run.
    ///
    /// Some providers report `stop` alongside tool calls, so the calls
    /// themselves decide; a `tool_calls` finish reason with no calls is final.
    pub fn requests_tools(&self) -> bool {
        self.message.has_tool_calls()
    }
}

/// Core trait implemented by model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai-compatible").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Run one chat completion.
    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, TwinError>;
}
