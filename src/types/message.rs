//! Message types for model communication.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A message in a conversation.
///
/// Assistant messages may carry `tool_calls`; tool messages always carry the
/// `tool_call_id` of the call they answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(text.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::text(Role::System, text)
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(Role::Assistant, text)
    }

    /// Create an assistant message requesting tool invocations.
    pub fn assistant_with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool result message.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Text content, or an empty string when the message has none.
    pub fn text_content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Whether this message asks for tools to be run.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// Raw JSON text exactly as the model produced it.
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Outcome of one tool invocation, already serialized for the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_call_id: String,
    /// JSON text.
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(tool_call_id: impl Into<String>, value: &serde_json::Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: value.to_string(),
            is_error: false,
        }
    }

    pub fn error(tool_call_id: impl Into<String>, value: &serde_json::Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: value.to_string(),
            is_error: true,
        }
    }

    /// Parse the content back into JSON.
    pub fn value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.content)
    }

    /// Convert into the tool-role message appended to the conversation.
    pub fn into_message(self) -> Message {
        Message::tool(self.tool_call_id, self.content)
    }
}

/// Verify that every tool message answers a call issued by an earlier
/// assistant message. Returns the offending tool call id on failure.
pub fn check_tool_call_pairing(messages: &[Message]) -> Result<(), String> {
    let mut issued: HashSet<&str> = HashSet::new();
    for message in messages {
        match message.role {
            Role::Assistant => {
                issued.extend(message.tool_calls.iter().map(|call| call.id.as_str()));
            }
            Role::Tool => {
                let id = message.tool_call_id.as_deref().unwrap_or_default();
                if !issued.contains(id) {
                    return Err(id.to_string());
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairing_accepts_answered_calls() {
        let messages = vec![
            Message::user("hi"),
            Message::assistant_with_tool_calls(
                None,
                vec![ToolCallRequest::new("call_1", "query_academics", "{}")],
            ),
            Message::tool("call_1", "\"table\""),
            Message::assistant("done"),
        ];
        assert!(check_tool_call_pairing(&messages).is_ok());
    }

    #[test]
    fn pairing_rejects_orphan_tool_message() {
        let messages = vec![Message::user("hi"), Message::tool("call_9", "{}")];
        assert_eq!(check_tool_call_pairing(&messages), Err("call_9".to_string()));
    }

    #[test]
    fn tool_message_omits_empty_tool_calls_when_serialized() {
        let json = serde_json::to_value(Message::tool("c1", "{}")).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "c1");
        assert!(json.get("tool_calls").is_none());
    }
}
