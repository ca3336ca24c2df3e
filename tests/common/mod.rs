//! Shared test helpers: scripted mock provider and in-memory collaborators.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use twin::academics::AcademicsStore;
use twin::agent::{Agent, AgentSettings};
use twin::context::AgentContext;
use twin::error::TwinError;
use twin::notify::Notifier;
use twin::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use twin::tools::builtin::default_registry;
use twin::tools::ToolRegistry;
use twin::types::*;
use twin::util::retry::RetryPolicy;

pub const ACADEMICS_TABLE: &str = "   course  grade\n0  Math101      A";

/// A mock provider that replays queued responses and records every request.
pub struct MockProvider {
    model_id: String,
    responses: Mutex<VecDeque<Result<ProviderResponse, TwinError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    latency: Duration,
}

impl MockProvider {
    pub fn new(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// Sleep this long inside every `generate` call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue a final text response.
    pub fn queue_response(&self, text: &str) {
        let mut response = ProviderResponse::text(text);
        response.usage = Usage {
            input_tokens: 10,
            output_tokens: 20,
            total_tokens: 30,
        };
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a response requesting the given `(id, name, arguments)` calls.
    pub fn queue_tool_calls(&self, calls: &[(&str, &str, serde_json::Value)]) {
        let calls = calls
            .iter()
            .map(|(id, name, args)| ToolCallRequest::new(*id, *name, args.to_string()))
            .collect();
        let mut response = ProviderResponse::tool_calls(calls);
        response.usage = Usage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        };
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a single tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.queue_tool_calls(&[(id, name, args)]);
    }

    /// Queue a provider failure.
    pub fn queue_error(&self, error: TwinError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, TwinError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(ProviderResponse::text("Mock response")))
    }
}

/// Notifier that keeps every message in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<(), TwinError> {
        self.sent.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Academics store returning a fixed table.
pub struct StaticAcademics;

#[async_trait]
impl AcademicsStore for StaticAcademics {
    async fn query(&self) -> Result<String, TwinError> {
        Ok(ACADEMICS_TABLE.to_string())
    }
}

pub fn context() -> AgentContext {
    AgentContext::new("Ada Lovelace", "Mathematician and writer.", "Contact: ada@example.com")
}

pub fn builtin_registry(notifier: Arc<RecordingNotifier>) -> Arc<ToolRegistry> {
    Arc::new(default_registry(notifier, Arc::new(StaticAcademics)).unwrap())
}

/// Agent over the built-in tools with no retries and no stream pacing.
pub fn agent(provider: Arc<MockProvider>, notifier: Arc<RecordingNotifier>) -> Agent {
    agent_with(provider, builtin_registry(notifier), test_settings())
}

pub fn agent_with(provider: Arc<MockProvider>, registry: Arc<ToolRegistry>, settings: AgentSettings) -> Agent {
    Agent::new(provider, registry, context(), settings)
}

pub fn test_settings() -> AgentSettings {
    AgentSettings::builder().retry(RetryPolicy::none()).build()
}
