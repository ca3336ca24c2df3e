//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

use super::arguments::ToolArguments;
use super::types::{AgentToolParameters, ToolDeclaration};
use crate::error::TwinError;

/// Context available during tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    /// Id of the model-issued call being served.
    pub tool_call_id: String,
}

impl ToolExecutionContext {
    pub fn for_call(tool_call_id: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
        }
    }
}

/// Core tool trait. Implement it to create custom tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema parameters.
    fn parameters(&self) -> &AgentToolParameters;

    /// Execute the tool with parsed arguments.
    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, TwinError>;

    /// Declaration advertised to the model.
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters().schema.clone(),
            strict: self.parameters().is_strict(),
        }
    }
}

type ToolHandler =
    dyn Fn(ToolArguments, ToolExecutionContext) -> BoxFuture<'static, Result<serde_json::Value, TwinError>> + Send + Sync;

/// Tool backed by an async closure. Handy for tests and one-off tools.
#[derive(Clone)]
pub struct AgentTool {
    name: String,
    description: String,
    parameters: AgentToolParameters,
    handler: Arc<ToolHandler>,
}

impl AgentTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, TwinError>> + Send + 'static,
    {
        let handler = move |args: ToolArguments, ctx: ToolExecutionContext| handler(args, ctx).boxed();
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(handler),
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, TwinError> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.name)
            .field("strict", &self.parameters.is_strict())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn agent_tool_executes_closure() {
        let tool = AgentTool::new(
            "greet",
            "Greet a person",
            AgentToolParameters::object().string("name", "Name", true).build(),
            |args, ctx| async move {
                let name = args.get_str("name")?;
                Ok(serde_json::json!({ "greeting": format!("Hello, {name}!"), "call": ctx.tool_call_id }))
            },
        );

        let result = tool
            .execute(
                &ToolArguments::new(serde_json::json!({"name": "World"})),
                &ToolExecutionContext::for_call("call_1"),
            )
            .await
            .unwrap();
        assert_eq!(result["greeting"], "Hello, World!");
        assert_eq!(result["call"], "call_1");

        let declaration = tool.declaration();
        assert_eq!(declaration.name, "greet");
        assert!(declaration.strict);
    }
}
