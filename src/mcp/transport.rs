//! Transport seam between the session client and an MCP tool server.
//!
//! The session owns exactly one [`ToolTransport`]; a [`TransportConnector`]
//! builds it and performs the protocol handshake. [`RmcpConnector`] is the
//! production implementation on top of the `rmcp` client.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use rmcp::{
    model::CallToolRequestParam,
    service::ServiceExt,
    transport::{StreamableHttpClientTransport, TokioChildProcess},
};
use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::{debug, info};

use super::types::ToolDescriptor;
use crate::config::{SessionConfig, TransportKind};

/// Raw outcome of a `tools/call`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// The full result payload.
    pub content: Value,
    /// Whether the server flagged the result as an error.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: Value) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    pub fn error(content: Value) -> Self {
        Self {
            content,
            is_error: true,
        }
    }

    /// Text of the result, see [`result_text`].
    pub fn text(&self) -> String {
        result_text(&self.content)
    }
}

/// Concatenated text items of an MCP result, falling back to the raw JSON.
pub fn result_text(content: &Value) -> String {
    let texts: Vec<&str> = content
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if !texts.is_empty() {
        return texts.join("\n");
    }
    match content {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// An established connection to a tool server.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// List the tools the server currently advertises.
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>>;

    /// Invoke one tool.
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>)
        -> anyhow::Result<ToolOutput>;

    /// Shut the connection down. Calling it again is a no-op.
    async fn close(&mut self) -> anyhow::Result<()>;
}

/// Builds a transport for a session and performs the handshake.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(&self, config: &SessionConfig) -> anyhow::Result<Box<dyn ToolTransport>>;
}

type DynClientService = rmcp::service::RunningService<
    rmcp::service::RoleClient,
    Box<dyn rmcp::service::DynService<rmcp::service::RoleClient>>,
>;

/// Connector backed by the `rmcp` client.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmcpConnector;

#[async_trait]
impl TransportConnector for RmcpConnector {
    async fn connect(&self, config: &SessionConfig) -> anyhow::Result<Box<dyn ToolTransport>> {
        let timeout = Duration::from_millis(config.timeout_ms);

        let service = match config.transport {
            TransportKind::LocalProcess => {
                let command = config
                    .launch_command
                    .as_deref()
                    .ok_or_else(|| anyhow!("local-process transport requires a launch command"))?;

                let mut cmd = Command::new(command);
                cmd.args(&config.launch_args);

                let transport =
                    TokioChildProcess::new(cmd).context("failed to spawn tool server process")?;
                debug!(command = %command, "Spawned tool server process");

                tokio::time::timeout(timeout, ().into_dyn().serve(transport))
                    .await
                    .map_err(|_| anyhow!("handshake timed out after {}ms", config.timeout_ms))?
                    .context("MCP handshake with local process failed")?
            }
            TransportKind::Network => {
                let address = config
                    .address
                    .clone()
                    .ok_or_else(|| anyhow!("network transport requires an address"))?;

                let transport = StreamableHttpClientTransport::from_uri(address);

                tokio::time::timeout(timeout, ().into_dyn().serve(transport))
                    .await
                    .map_err(|_| anyhow!("handshake timed out after {}ms", config.timeout_ms))?
                    .context("MCP handshake over network failed")?
            }
        };

        info!(
            transport = %config.transport,
            target = %config.target(),
            "MCP handshake complete"
        );

        Ok(Box::new(RmcpTransport {
            service: Some(service),
            timeout,
        }))
    }
}

/// Transport over a running `rmcp` client service.
pub struct RmcpTransport {
    service: Option<DynClientService>,
    timeout: Duration,
}

impl RmcpTransport {
    fn service(&self) -> anyhow::Result<&DynClientService> {
        self.service
            .as_ref()
            .ok_or_else(|| anyhow!("transport already closed"))
    }
}

#[async_trait]
impl ToolTransport for RmcpTransport {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        let service = self.service()?;
        let result = tokio::time::timeout(self.timeout, service.list_tools(Default::default()))
            .await
            .map_err(|_| anyhow!("tools/list timed out after {}ms", self.timeout.as_millis()))?
            .context("tools/list failed")?;

        Ok(result
            .tools
            .into_iter()
            .map(|tool| {
                let schema = Value::Object((*tool.input_schema).clone());
                ToolDescriptor::from_json_schema(
                    tool.name.to_string(),
                    tool.description.as_deref().map(str::to_string),
                    &schema,
                )
            })
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> anyhow::Result<ToolOutput> {
        let service = self.service()?;
        let request = CallToolRequestParam {
            name: name.to_string().into(),
            arguments: Some(arguments),
        };

        let result = tokio::time::timeout(self.timeout, service.call_tool(request))
            .await
            .map_err(|_| anyhow!("tools/call {} timed out after {}ms", name, self.timeout.as_millis()))?
            .with_context(|| format!("tools/call failed for {}", name))?;

        let content = serde_json::to_value(result)?;
        let is_error = content
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(ToolOutput { content, is_error })
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        if let Some(service) = self.service.take() {
            service
                .cancel()
                .await
                .context("failed to stop MCP client service")?;
        }
        Ok(())
    }
}
