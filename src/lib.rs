//! twin: a chat agent that answers visitors on behalf of one person.
//!
//! The agent grounds a model in the person's summary and resume, lets it
//! call a small set of tools (record a visitor's contact details, record a
//! question it could not answer, look up academic records), and returns the
//! reply as a stream of growing prefixes.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use twin::prelude::*;
//! use twin::academics::SqliteAcademics;
//! use twin::notify::LogNotifier;
//! use twin::provider::openai::OpenAiCompatibleProvider;
//! use twin::tools::builtin::default_registry;
//!
//! # async fn example() -> twin::error::Result<()> {
//! let provider = Arc::new(OpenAiCompatibleProvider::new("gemini-2.0-flash", "api-key", None));
//! let registry = default_registry(Arc::new(LogNotifier), Arc::new(SqliteAcademics::new("me/academics.db")))?;
//! let context = AgentContext::new("Ada Lovelace", "Mathematician.", "Resume text");
//! let agent = Agent::new(provider, Arc::new(registry), context, AgentSettings::default());
//!
//! let mut replies = agent.chat("What's your email?", Vec::new());
//! while let Some(prefix) = replies.next().await {
//!     println!("{}", prefix?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod academics;
pub mod agent;
pub mod config;
pub mod context;
pub mod error;
pub mod notify;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
