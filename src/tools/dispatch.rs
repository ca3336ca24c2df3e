//! Tool dispatch: turn model-issued tool calls into tool results.
//!
//! Every failure below this boundary (unknown tool, malformed arguments,
//! schema violations, handler errors, timeouts) becomes result data the model
//! can read. `dispatch` itself never fails.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::registry::ToolRegistry;
use super::tool::ToolExecutionContext;
use super::validation::validate_arguments;
use crate::error::TwinError;
use crate::types::{ToolCallRequest, ToolResult};
use crate::util::timeout::with_timeout;

const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes tool calls against a registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    tool_timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Per-call execution timeout.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run all calls concurrently. Result `i` answers call `i`.
    pub async fn dispatch(&self, calls: &[ToolCallRequest]) -> Vec<ToolResult> {
        join_all(calls.iter().map(|call| self.dispatch_one(call))).await
    }

    async fn dispatch_one(&self, call: &ToolCallRequest) -> ToolResult {
        debug!(tool = %call.name, id = %call.id, "Tool called");

        let Some(tool) = self.registry.resolve(&call.name) else {
            warn!(tool = %call.name, "Tool not found");
            return ToolResult::error(&call.id, &serde_json::json!({}));
        };

        let args = match ToolArguments::parse(&call.arguments) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Rejected tool arguments");
                let message = match e {
                    TwinError::InvalidArgument(message) => message,
                    other => other.to_string(),
                };
                return ToolResult::error(
                    &call.id,
                    &serde_json::json!({ "error": format!("invalid arguments: {message}") }),
                );
            }
        };

        let args = match validate_arguments(args.raw(), &tool.parameters().schema) {
            Ok(checked) if checked.undeclared.is_empty() => args,
            Ok(checked) => {
                warn!(tool = %call.name, fields = ?checked.undeclared, "Dropping undeclared tool arguments");
                args.without(&checked.undeclared)
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool arguments failed validation");
                return ToolResult::error(
                    &call.id,
                    &serde_json::json!({ "error": format!("invalid arguments: {e}") }),
                );
            }
        };

        let ctx = ToolExecutionContext::for_call(&call.id);
        match with_timeout(self.tool_timeout, tool.execute(&args, &ctx)).await {
            Ok(value) => ToolResult::ok(&call.id, &value),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                ToolResult::error(&call.id, &serde_json::json!({ "error": e.to_string() }))
            }
        }
    }
}
