//! OpenAI-compatible Chat Completions provider.
//!
//! Defaults to Gemini's OpenAI-compatible endpoint; any server speaking the
//! Chat Completions wire format works.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::TwinError;
use crate::types::{FinishReason, Message, Role, ToolCallRequest, Usage};

use super::http::{bearer_headers, shared_client, status_to_error};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Provider for any OpenAI-compatible Chat Completions API.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    model_id: String,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(model_id: impl Into<String>, api_key: impl Into<String>, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            model_id: model_id.into(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request.messages.iter().map(message_to_openai).collect();

        let mut body = serde_json::json!({
            "model": self.model_id,
            "messages": messages,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(max) = request.settings.max_tokens {
                obj.insert("max_tokens".into(), max.into());
            }
            if let Some(temp) = request.settings.temperature {
                obj.insert("temperature".into(), temp.into());
            }
            if let Some(top_p) = request.settings.top_p {
                obj.insert("top_p".into(), top_p.into());
            }
            if !request.tools.is_empty() {
                let tool_defs: Vec<serde_json::Value> = request
                    .tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            }
                        })
                    })
                    .collect();
                obj.insert("tools".into(), tool_defs.into());
            }
        }

        body
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    fn provider_name(&self) -> &str {
        "openai-compatible"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, TwinError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model_id, messages = request.messages.len(), "Chat completion");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: ChatResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TwinError::api(200, "No choices in chat completion response"))?;

        let tool_calls: Vec<ToolCallRequest> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, tc)| ToolCallRequest {
                id: tc.id.filter(|id| !id.is_empty()).unwrap_or_else(|| format!("call_{i}")),
                name: tc.function.name,
                arguments: match tc.function.arguments {
                    serde_json::Value::String(raw) => raw,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                },
            })
            .collect();

        Ok(ProviderResponse {
            message: Message::assistant_with_tool_calls(choice.message.content, tool_calls),
            finish_reason: choice.finish_reason.as_deref().and_then(FinishReason::from_wire),
            usage: data
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
        })
    }
}

fn message_to_openai(msg: &Message) -> serde_json::Value {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let mut value = serde_json::json!({
        "role": role,
        "content": msg.content,
    });

    if let Some(obj) = value.as_object_mut() {
        if msg.has_tool_calls() {
            let calls: Vec<serde_json::Value> = msg
                .tool_calls
                .iter()
                .map(|tc| {
                    serde_json::json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments,
                        }
                    })
                })
                .collect();
            obj.insert("tool_calls".into(), calls.into());
        }
        if let Some(id) = &msg.tool_call_id {
            obj.insert("tool_call_id".into(), id.clone().into());
        }
    }

    value
}

// Chat Completions response types (internal)

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Deserialize)]
struct ChatToolCall {
    #[serde(default)]
    id: Option<String>,
    function: ChatFunction,
}

#[derive(Deserialize)]
struct ChatFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolDeclaration;
    use crate::types::GenerationSettings;

    #[test]
    fn request_body_carries_tools_and_tool_messages() {
        let provider = OpenAiCompatibleProvider::new("gemini-2.0-flash", "key", None);
        let request = ProviderRequest {
            messages: vec![
                Message::system("sys"),
                Message::user("hi"),
                Message::assistant_with_tool_calls(
                    None,
                    vec![ToolCallRequest::new("c1", "query_academics", "{}")],
                ),
                Message::tool("c1", "\"table\""),
            ],
            tools: vec![ToolDeclaration {
                name: "query_academics".into(),
                description: "academics".into(),
                parameters: serde_json::json!({"type": "object"}),
                strict: true,
            }],
            settings: GenerationSettings::builder().temperature(0.2).build(),
        };

        let body = provider.build_request_body(&request);
        assert_eq!(body["model"], "gemini-2.0-flash");
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["tools"][0]["function"]["name"], "query_academics");
        assert_eq!(body["messages"][2]["content"], serde_json::Value::Null);
        assert_eq!(body["messages"][2]["tool_calls"][0]["function"]["arguments"], "{}");
        assert_eq!(body["messages"][3]["role"], "tool");
        assert_eq!(body["messages"][3]["tool_call_id"], "c1");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OpenAiCompatibleProvider::new("m", "k", Some("http://localhost:1234/v1/".into()));
        assert_eq!(provider.base_url(), "http://localhost:1234/v1");
    }
}
