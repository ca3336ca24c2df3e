//! Tool system for function calling.

pub mod arguments;
pub mod builtin;
pub mod dispatch;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use dispatch::Dispatcher;
pub use registry::ToolRegistry;
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::{AgentToolParameters, ToolDeclaration};
