//! Convenience re-exports for common use.

pub use crate::agent::{Agent, AgentSettings, ChatOutcome, ChatState, ReplyStream};
pub use crate::config::TwinConfig;
pub use crate::context::AgentContext;
pub use crate::error::{Result, TwinError};
pub use crate::provider::{ModelProvider, ProviderRequest, ProviderResponse};
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments, ToolRegistry};
pub use crate::types::{FinishReason, GenerationSettings, Message, Role, ToolCallRequest, ToolResult, Usage};
