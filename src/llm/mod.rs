//! Language model provider: the tool-calling conversation types, the
//! [`LlmProvider`] seam and its Anthropic Messages API implementation.

mod client;
mod provider;
mod types;

pub use client::{AnthropicClient, ANTHROPIC_VERSION};
pub use provider::LlmProvider;
pub use types::*;
