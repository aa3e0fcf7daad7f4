use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use super::cache::TimedCache;
use super::catalog::{KnownTool, SchemaCategory};
use super::transport::{RmcpConnector, ToolTransport, TransportConnector};
use super::types::{ConnectionState, InvocationRecord, SessionPhase, ToolDescriptor};
use super::validation::{normalize_parameters, validate_parameters};
use crate::config::{SessionConfig, TransportKind};
use crate::error::{SessionError, SessionResult};

/// Tool name recorded for discovery calls.
pub const TOOLS_LIST: &str = "tools/list";

const REDACTED: &str = "***";

/// One logical connection to a tool server.
///
/// Owns its transport handle, the cached tool catalog and an append-only
/// call history. Not designed for concurrent mutation: run test cases one
/// at a time per session.
pub struct SessionClient {
    config: SessionConfig,
    connector: Arc<dyn TransportConnector>,
    transport: Option<Box<dyn ToolTransport>>,
    phase: SessionPhase,
    authenticated: bool,
    connected_at: Option<DateTime<Utc>>,
    tools: TimedCache<Vec<ToolDescriptor>>,
    history: Vec<InvocationRecord>,
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("transport", &self.config.transport)
            .field("target", &self.config.target())
            .field("phase", &self.phase)
            .field("authenticated", &self.authenticated)
            .field("history_len", &self.history.len())
            .finish()
    }
}

impl SessionClient {
    /// Create an unconnected session using the `rmcp` transports.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_connector(config, Arc::new(RmcpConnector))
    }

    /// Create an unconnected session with a custom connector.
    pub fn with_connector(config: SessionConfig, connector: Arc<dyn TransportConnector>) -> Self {
        let tools = TimedCache::with_max_age_secs(config.tool_cache_max_age_secs);
        Self {
            config,
            connector,
            transport: None,
            phase: SessionPhase::Disconnected,
            authenticated: false,
            connected_at: None,
            tools,
            history: Vec::new(),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Connect, handshake and probe the server with a tool discovery call.
    ///
    /// On any failure the session is rolled back to `Disconnected` and the
    /// error is returned. Connecting a ready session is a no-op.
    pub async fn connect(&mut self) -> SessionResult<()> {
        if self.phase == SessionPhase::Ready {
            debug!("Session already ready, skipping connect");
            return Ok(());
        }

        self.check_target()?;

        info!(
            transport = %self.config.transport,
            target = %self.config.target(),
            "Connecting to tool server"
        );
        self.phase = SessionPhase::Connecting;

        let transport = match self.connector.connect(&self.config).await {
            Ok(t) => t,
            Err(e) => {
                error!(error = %e, "Failed to establish tool server connection");
                self.reset();
                return Err(self.transport_error("failed to establish connection", e));
            }
        };
        self.transport = Some(transport);
        self.phase = SessionPhase::Connected;

        let now = Utc::now();
        let probe = match self.transport.as_deref() {
            Some(transport) => fetch_catalog(transport, &mut self.history).await,
            None => Err(SessionError::not_ready("probe tool server")),
        };

        match probe {
            Ok(tools) => {
                info!(tool_count = tools.len(), "Tool server session ready");
                self.tools.store(tools, now);
                self.phase = SessionPhase::Ready;
                self.connected_at = Some(now);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Tool discovery probe failed");
                self.close_transport().await;
                self.reset();
                Err(self.transport_error("tool discovery probe failed", anyhow::Error::new(e)))
            }
        }
    }

    /// Close the connection. Safe to call repeatedly or without connecting.
    pub async fn disconnect(&mut self) {
        if self.transport.is_some() {
            info!(target = %self.config.target(), "Disconnecting from tool server");
        }
        self.close_transport().await;
        self.reset();
    }

    async fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!(error = %e, "Error while closing tool server transport");
            }
        }
    }

    fn reset(&mut self) {
        self.transport = None;
        self.phase = SessionPhase::Disconnected;
        self.authenticated = false;
        self.connected_at = None;
        self.tools.clear();
    }

    fn check_target(&self) -> SessionResult<()> {
        let missing = match self.config.transport {
            TransportKind::Network => self.config.address.as_deref().map_or(true, str::is_empty),
            TransportKind::LocalProcess => self
                .config
                .launch_command
                .as_deref()
                .map_or(true, str::is_empty),
        };
        if !missing {
            return Ok(());
        }

        let field = match self.config.transport {
            TransportKind::Network => "an address",
            TransportKind::LocalProcess => "a launch command",
        };
        Err(self.transport_error(
            "invalid transport configuration",
            anyhow::anyhow!("{} transport requires {}", self.config.transport, field),
        ))
    }

    fn transport_error(&self, message: &str, source: anyhow::Error) -> SessionError {
        SessionError::Transport {
            message: message.to_string(),
            kind: self.config.transport.to_string(),
            target: self.config.target(),
            source,
        }
    }

    fn ensure_ready(&self, operation: &str) -> SessionResult<()> {
        if self.phase == SessionPhase::Ready && self.transport.is_some() {
            Ok(())
        } else {
            Err(SessionError::not_ready(operation))
        }
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    /// Re-list the server's tools and replace the cached catalog wholesale.
    pub async fn discover_tools(&mut self) -> SessionResult<Vec<ToolDescriptor>> {
        self.ensure_ready("discover tools")?;
        let now = Utc::now();
        let tools = match self.transport.as_deref() {
            Some(transport) => fetch_catalog(transport, &mut self.history).await?,
            None => return Err(SessionError::not_ready("discover tools")),
        };
        self.tools.store(tools.clone(), now);
        Ok(tools)
    }

    /// Cached catalog, re-discovered first if it is stale or invalidated.
    pub async fn tools_or_refresh(&mut self) -> SessionResult<Vec<ToolDescriptor>> {
        self.ensure_ready("list tools")?;
        let transport = match self.transport.as_deref() {
            Some(transport) => transport,
            None => return Err(SessionError::not_ready("list tools")),
        };
        let history = &mut self.history;
        self.tools
            .get_or_refresh(Utc::now(), move || fetch_catalog(transport, history))
            .await
    }

    /// Copy of the most recently discovered catalog.
    pub fn cached_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.get().cloned().unwrap_or_default()
    }

    // ========================================================================
    // Invocation
    // ========================================================================

    /// Invoke a tool by name.
    ///
    /// Known tools are validated first; a validation failure returns
    /// `InvalidInput` without recording anything. Every attempted call
    /// appends exactly one [`InvocationRecord`].
    pub async fn invoke(&mut self, name: &str, params: Map<String, Value>) -> SessionResult<Value> {
        self.ensure_ready(&format!("invoke {}", name))?;

        let known = KnownTool::from_name(name);
        let params = match known {
            Some(tool) => {
                let mut params = self.with_default_credentials(tool, params);
                validate_parameters(tool, &params)?;
                normalize_parameters(tool, &mut params);
                params
            }
            None => params,
        };

        let transport = match self.transport.as_deref() {
            Some(transport) => transport,
            None => return Err(SessionError::not_ready(format!("invoke {}", name))),
        };

        let record = InvocationRecord::new(name, redact(&params));
        let start = Instant::now();
        let outcome = transport.call_tool(name, params).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) if !output.is_error => {
                debug!(tool = %name, duration_ms, "Tool call succeeded");
                self.history
                    .push(record.succeeded(output.content.clone(), duration_ms));
                if let Some(tool) = known {
                    self.apply_auth_effect(tool);
                }
                Ok(output.content)
            }
            Ok(output) => {
                let message = output.text();
                warn!(tool = %name, duration_ms, error = %message, "Tool reported an error");
                self.history.push(record.failed(message.clone(), duration_ms));
                Err(SessionError::ToolExecution {
                    tool: name.to_string(),
                    message,
                })
            }
            Err(e) => {
                let message = format!("{:#}", e);
                error!(tool = %name, duration_ms, error = %message, "Tool call failed");
                self.history.push(record.failed(message.clone(), duration_ms));
                Err(SessionError::ToolExecution {
                    tool: name.to_string(),
                    message,
                })
            }
        }
    }

    fn with_default_credentials(
        &self,
        tool: KnownTool,
        mut params: Map<String, Value>,
    ) -> Map<String, Value> {
        if tool != KnownTool::Authenticate {
            return params;
        }
        if let Some(creds) = &self.config.credentials {
            if let Some(store_id) = creds.store_id {
                params.entry("store_id").or_insert_with(|| json!(store_id));
            }
            params
                .entry("username")
                .or_insert_with(|| json!(creds.username));
            params
                .entry("password")
                .or_insert_with(|| json!(creds.password));
        }
        params
    }

    fn apply_auth_effect(&mut self, tool: KnownTool) {
        match tool {
            KnownTool::Authenticate => {
                info!("Session authenticated");
                self.authenticated = true;
                self.tools.invalidate();
            }
            KnownTool::CloseSession => {
                info!("Session closed on server");
                self.authenticated = false;
                self.tools.invalidate();
            }
            _ => {}
        }
    }

    /// Today's date according to the server.
    pub async fn get_current_date(&mut self) -> SessionResult<Value> {
        self.invoke(KnownTool::GetCurrentDate.name(), Map::new())
            .await
    }

    /// Authenticate against a store. Missing fields come from the configured credentials.
    pub async fn authenticate(&mut self, store_id: Option<i64>) -> SessionResult<Value> {
        let mut params = Map::new();
        if let Some(id) = store_id {
            params.insert("store_id".to_string(), json!(id));
        }
        self.invoke(KnownTool::Authenticate.name(), params).await
    }

    /// End the server-side authenticated session.
    pub async fn close_session(&mut self) -> SessionResult<Value> {
        self.invoke(KnownTool::CloseSession.name(), Map::new()).await
    }

    /// Explore one section of the GraphQL schema.
    pub async fn explore_schema(&mut self, category: &str) -> SessionResult<Value> {
        let mut params = Map::new();
        params.insert("category".to_string(), json!(category));
        self.invoke(KnownTool::ExploreSchema.name(), params).await
    }

    /// Explore a section by enum value.
    pub async fn explore_category(&mut self, category: SchemaCategory) -> SessionResult<Value> {
        self.explore_schema(category.as_str()).await
    }

    /// Free-text search over the schema.
    pub async fn search_schema(&mut self, keyword: &str) -> SessionResult<Value> {
        let mut params = Map::new();
        params.insert("keyword".to_string(), json!(keyword));
        self.invoke(KnownTool::SearchSchema.name(), params).await
    }

    /// Describe one named type.
    pub async fn describe_type(&mut self, type_name: &str) -> SessionResult<Value> {
        let mut params = Map::new();
        params.insert("type_name".to_string(), json!(type_name));
        self.invoke(KnownTool::DescribeType.name(), params).await
    }

    /// Execute a GraphQL document.
    pub async fn execute_graphql(
        &mut self,
        query: &str,
        variables: Option<Value>,
    ) -> SessionResult<Value> {
        let mut params = Map::new();
        params.insert("query".to_string(), json!(query));
        if let Some(variables) = variables {
            params.insert("variables".to_string(), variables);
        }
        self.invoke(KnownTool::ExecuteGraphql.name(), params).await
    }

    // ========================================================================
    // Introspection (all return copies)
    // ========================================================================

    /// Full call history in insertion order.
    pub fn call_history(&self) -> Vec<InvocationRecord> {
        self.history.clone()
    }

    /// Records submitted at or after `since`.
    pub fn call_history_since(&self, since: DateTime<Utc>) -> Vec<InvocationRecord> {
        self.history
            .iter()
            .filter(|record| record.submitted_at >= since)
            .cloned()
            .collect()
    }

    pub fn connection_state(&self) -> ConnectionState {
        let connected = matches!(self.phase, SessionPhase::Connected | SessionPhase::Ready);
        ConnectionState {
            phase: self.phase,
            connected,
            initialized: self.phase == SessionPhase::Ready,
            authenticated: self.authenticated,
            tool_count: self.tools.get().map_or(0, Vec::len),
            connected_at: self.connected_at,
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// List tools and record the attempt as a synthetic `tools/list` invocation.
async fn fetch_catalog(
    transport: &dyn ToolTransport,
    history: &mut Vec<InvocationRecord>,
) -> SessionResult<Vec<ToolDescriptor>> {
    let record = InvocationRecord::new(TOOLS_LIST, Map::new());
    let start = Instant::now();
    let outcome = transport.list_tools().await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(tools) => {
            let names: Vec<Value> = tools.iter().map(|t| json!(t.name)).collect();
            debug!(tool_count = tools.len(), duration_ms, "Discovered tools");
            history.push(record.succeeded(Value::Array(names), duration_ms));
            Ok(tools)
        }
        Err(e) => {
            let message = format!("{:#}", e);
            history.push(record.failed(message.clone(), duration_ms));
            Err(SessionError::ToolExecution {
                tool: TOOLS_LIST.to_string(),
                message,
            })
        }
    }
}

fn redact(params: &Map<String, Value>) -> Map<String, Value> {
    params
        .iter()
        .map(|(key, value)| {
            if key == "password" {
                (key.clone(), json!(REDACTED))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_disconnected() {
        let session = SessionClient::new(SessionConfig::network("http://localhost:4000/mcp"));
        let state = session.connection_state();
        assert_eq!(state.phase, SessionPhase::Disconnected);
        assert!(!state.connected);
        assert!(!state.initialized);
        assert!(!state.authenticated);
        assert!(session.call_history().is_empty());
        assert!(session.cached_tools().is_empty());
    }

    #[test]
    fn test_redact_hides_password_only() {
        let params = json!({"store_id": 1, "username": "alice", "password": "hunter2"});
        let redacted = redact(params.as_object().unwrap());
        assert_eq!(redacted["password"], json!("***"));
        assert_eq!(redacted["username"], json!("alice"));
        assert_eq!(redacted["store_id"], json!(1));
    }

    #[tokio::test]
    async fn test_connect_fails_fast_without_address() {
        let mut session = SessionClient::new(SessionConfig::default());
        let err = session.connect().await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("network"));
        assert_eq!(session.phase(), SessionPhase::Disconnected);
        assert!(session.call_history().is_empty());
    }
}
