//! # MCP Tool Harness
//!
//! Automated evaluation of how well a language model uses the tools of an
//! MCP tool server to answer natural-language requests against a live
//! backend.
//!
//! ## Components
//!
//! - **Session client** ([`mcp`]): connection lifecycle, tool discovery,
//!   validated tool invocation and an append-only call history
//! - **Schema translator** ([`translator`]): tool descriptors to the
//!   model's tool-calling format
//! - **Orchestrator** ([`orchestrator`]): the prompt / tool-call / result
//!   loop for one test case, and sequential suite runs
//! - **Scorer** ([`evaluation`]): deterministic pass/fail and 0-100 scores
//!
//! ## Architecture
//!
//! ```text
//! Fixtures → Orchestrator ─→ LLM provider (HTTP)
//!                 │
//!                 └─→ SessionClient ─→ MCP tool server (stdio | HTTP)
//!                 ↓
//!             Scorer → SuiteReport (JSON)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mcp_tool_harness::{Config, FixtureRegistry, Orchestrator, SessionClient};
//! use mcp_tool_harness::llm::AnthropicClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let provider = AnthropicClient::new(&config.provider, config.request.clone())?;
//!     let mut session = SessionClient::new(config.session.clone());
//!     session.connect().await?;
//!
//!     let mut orchestrator =
//!         Orchestrator::initialize(session, Arc::new(provider), config.evaluation.clone())?;
//!     let report = orchestrator.run_suite(&FixtureRegistry::new().list(None)).await;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!
//!     orchestrator.into_session().disconnect().await;
//!     Ok(())
//! }
//! ```

/// Configuration loaded from the environment.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Rule-based scoring of executed test cases.
pub mod evaluation;
/// Test case model, registry and built-in cases.
pub mod fixtures;
/// Language model provider boundary.
pub mod llm;
/// MCP session client.
pub mod mcp;
/// Conversation orchestrator and suite runner.
pub mod orchestrator;
/// System instruction construction.
pub mod prompts;
/// Tool schema translation.
pub mod translator;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use fixtures::{FixtureRegistry, TestCase};
pub use mcp::SessionClient;
pub use orchestrator::{Orchestrator, SuiteReport, TestResult};
