//! Built-in tools: lead capture, unanswered-question logging, academics lookup.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::arguments::ToolArguments;
use super::registry::ToolRegistry;
use super::tool::{Tool, ToolExecutionContext};
use super::types::AgentToolParameters;
use crate::academics::AcademicsStore;
use crate::error::TwinError;
use crate::notify::Notifier;

pub const RECORD_USER_DETAILS: &str = "record_user_details";
pub const RECORD_UNKNOWN_QUESTION: &str = "record_unknown_question";
pub const QUERY_ACADEMICS: &str = "query_academics";

fn recorded() -> serde_json::Value {
    serde_json::json!({ "recorded": "ok" })
}

#[derive(Debug, Deserialize)]
struct UserDetails {
    email: String,
    name: Option<String>,
    notes: Option<String>,
}

/// Records a visitor who left an email address.
pub struct RecordUserDetails {
    notifier: Arc<dyn Notifier>,
    parameters: AgentToolParameters,
}

impl RecordUserDetails {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            parameters: AgentToolParameters::object()
                .string("email", "The email address of this user", true)
                .string("name", "The user's name, if they provided it", false)
                .string(
                    "notes",
                    "Any additional information about the conversation that's worth recording to give context",
                    false,
                )
                .build(),
        }
    }
}

#[async_trait]
impl Tool for RecordUserDetails {
    fn name(&self) -> &str {
        RECORD_USER_DETAILS
    }

    fn description(&self) -> &str {
        "Use this tool to record that a user is interested in being in touch and provided an email address"
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, TwinError> {
        let details: UserDetails = args.deserialize()?;
        let name = details.name.as_deref().unwrap_or("Name not provided");
        let notes = details.notes.as_deref().unwrap_or("not provided");
        info!(call = %ctx.tool_call_id, email = %details.email, "Recording user details");
        self.notifier
            .notify(&format!(
                "Recording {name} with email {} and notes {notes}",
                details.email
            ))
            .await?;
        Ok(recorded())
    }
}

#[derive(Debug, Deserialize)]
struct UnknownQuestion {
    question: String,
}

/// Records a question the assistant could not answer.
pub struct RecordUnknownQuestion {
    notifier: Arc<dyn Notifier>,
    parameters: AgentToolParameters,
}

impl RecordUnknownQuestion {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            parameters: AgentToolParameters::object()
                .string("question", "The question that couldn't be answered", true)
                .build(),
        }
    }
}

#[async_trait]
impl Tool for RecordUnknownQuestion {
    fn name(&self) -> &str {
        RECORD_UNKNOWN_QUESTION
    }

    fn description(&self) -> &str {
        "Always use this tool to record any question that couldn't be answered as you didn't know the answer"
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, TwinError> {
        let UnknownQuestion { question } = args.deserialize()?;
        info!(call = %ctx.tool_call_id, %question, "Recording unknown question");
        self.notifier.notify(&format!("Recording {question}")).await?;
        Ok(recorded())
    }
}

/// Returns the academics table as text.
pub struct QueryAcademics {
    store: Arc<dyn AcademicsStore>,
    parameters: AgentToolParameters,
}

impl QueryAcademics {
    pub fn new(store: Arc<dyn AcademicsStore>) -> Self {
        Self {
            store,
            parameters: AgentToolParameters::empty(),
        }
    }
}

#[async_trait]
impl Tool for QueryAcademics {
    fn name(&self) -> &str {
        QUERY_ACADEMICS
    }

    fn description(&self) -> &str {
        "Use this tool to query the academics table and get the information about academics related questions"
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        _args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, TwinError> {
        let table = self.store.query().await?;
        Ok(serde_json::Value::String(table))
    }
}

/// Registry holding the three built-in tools, in their canonical order.
pub fn default_registry(
    notifier: Arc<dyn Notifier>,
    academics: Arc<dyn AcademicsStore>,
) -> Result<ToolRegistry, TwinError> {
    ToolRegistry::new()
        .with(Arc::new(RecordUserDetails::new(notifier.clone())))?
        .with(Arc::new(RecordUnknownQuestion::new(notifier)))?
        .with(Arc::new(QueryAcademics::new(academics)))
}
