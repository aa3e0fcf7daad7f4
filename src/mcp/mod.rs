//! Protocol session client for MCP tool servers.
//!
//! This module provides:
//! - [`SessionClient`]: connection lifecycle, tool discovery and invocation
//! - [`KnownTool`]: the explicit table of tools the harness can dispatch
//! - Parameter validation applied before any call is attempted
//! - [`TimedCache`]: the age-bounded tool catalog cache
//! - The transport seam ([`TransportConnector`], [`ToolTransport`]) with an
//!   `rmcp`-backed implementation

mod cache;
mod catalog;
mod session;
mod transport;
mod types;
mod validation;

pub use cache::TimedCache;
pub use catalog::{KnownTool, SchemaCategory};
pub use session::{SessionClient, TOOLS_LIST};
pub use transport::{
    result_text, RmcpConnector, RmcpTransport, ToolOutput, ToolTransport, TransportConnector,
};
pub use types::*;
pub use validation::{
    normalize_parameters, validate_keyword, validate_parameters, validate_store_id,
    MAX_KEYWORD_LENGTH,
};
