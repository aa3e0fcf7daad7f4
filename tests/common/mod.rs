//! Shared test doubles: a scripted tool server behind the transport seam
//! and a scripted language-model provider.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use mcp_tool_harness::config::{Credentials, SessionConfig};
use mcp_tool_harness::error::{ProviderError, ProviderResult};
use mcp_tool_harness::llm::{LlmProvider, ProviderReply, ProviderRequest, RequestedToolCall, TokenUsage};
use mcp_tool_harness::mcp::{
    ParamField, ParamSchema, SessionClient, ToolDescriptor, ToolOutput, ToolTransport,
    TransportConnector,
};

// ============================================================================
// Scripted tool server
// ============================================================================

/// Observable state of the fake tool server.
#[derive(Debug, Default)]
pub struct ServerState {
    pub authenticated: bool,
    /// Every `tools/call` in arrival order.
    pub calls: Vec<(String, Map<String, Value>)>,
    pub list_calls: usize,
    pub fail_list: bool,
    pub fail_connect: bool,
    /// Tool names that answer with `isError: true`.
    pub erroring: HashSet<String>,
    pub closed: usize,
    pub connects: usize,
}

impl ServerState {
    pub fn call_names(&self) -> Vec<String> {
        self.calls.iter().map(|(name, _)| name.clone()).collect()
    }
}

pub type SharedServer = Arc<Mutex<ServerState>>;

pub fn new_server() -> SharedServer {
    Arc::new(Mutex::new(ServerState::default()))
}

/// Tools always advertised.
pub fn public_tools() -> Vec<ToolDescriptor> {
    let categories = ["queries", "mutations", "types", "inputs", "enums", "interfaces"]
        .iter()
        .map(|c| json!(c))
        .collect();

    vec![
        ToolDescriptor::new("get_current_date").with_description("Today's date"),
        ToolDescriptor::new("authenticate")
            .with_description("Log in to a store")
            .with_parameter(ParamField::required("store_id", ParamSchema::integer())),
        ToolDescriptor::new("close_session").with_description("Log out"),
        ToolDescriptor::new("explore_schema").with_parameter(ParamField::required(
            "category",
            ParamSchema::string().with_enum(categories),
        )),
        ToolDescriptor::new("search_schema")
            .with_parameter(ParamField::required("keyword", ParamSchema::string())),
        ToolDescriptor::new("describe_type")
            .with_parameter(ParamField::required("type_name", ParamSchema::string())),
    ]
}

/// Tool only advertised to authenticated sessions.
pub fn privileged_tool() -> ToolDescriptor {
    ToolDescriptor::new("execute_graphql")
        .with_description("Run a GraphQL query")
        .with_parameter(ParamField::required("query", ParamSchema::string()))
        .with_parameter(ParamField::optional("variables", ParamSchema::object(Vec::new())))
}

fn text_result(text: &str) -> Value {
    json!({"content": [{"type": "text", "text": text}], "isError": false})
}

pub struct ScriptedTransport {
    server: SharedServer,
}

#[async_trait]
impl ToolTransport for ScriptedTransport {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        let mut server = self.server.lock().unwrap();
        server.list_calls += 1;
        if server.fail_list {
            anyhow::bail!("tools/list not supported");
        }
        let mut tools = public_tools();
        if server.authenticated {
            tools.push(privileged_tool());
        }
        Ok(tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> anyhow::Result<ToolOutput> {
        let mut server = self.server.lock().unwrap();
        server.calls.push((name.to_string(), arguments.clone()));

        if server.erroring.contains(name) {
            return Ok(ToolOutput::error(json!({
                "content": [{"type": "text", "text": format!("{} exploded", name)}],
                "isError": true
            })));
        }

        let output = match name {
            "get_current_date" => text_result("2025-01-15"),
            "authenticate" => {
                server.authenticated = true;
                text_result(&format!("Authenticated to store {}", arguments["store_id"]))
            }
            "close_session" => {
                server.authenticated = false;
                text_result("Session closed")
            }
            "explore_schema" => text_result("Query { products, orders }"),
            "search_schema" => text_result("Order, OrderLine"),
            "describe_type" => text_result("type Product { id: ID!, name: String! }"),
            "execute_graphql" => text_result(r#"{"data":{"products":[]}}"#),
            other => text_result(&format!("ok: {}", other)),
        };
        Ok(ToolOutput::success(output))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.server.lock().unwrap().closed += 1;
        Ok(())
    }
}

pub struct ScriptedConnector {
    server: SharedServer,
}

impl ScriptedConnector {
    pub fn new(server: SharedServer) -> Arc<Self> {
        Arc::new(Self { server })
    }
}

#[async_trait]
impl TransportConnector for ScriptedConnector {
    async fn connect(&self, _config: &SessionConfig) -> anyhow::Result<Box<dyn ToolTransport>> {
        let mut server = self.server.lock().unwrap();
        server.connects += 1;
        if server.fail_connect {
            anyhow::bail!("connection refused");
        }
        Ok(Box::new(ScriptedTransport {
            server: self.server.clone(),
        }))
    }
}

pub fn test_config() -> SessionConfig {
    SessionConfig::network("http://tool-server.test/mcp").with_credentials(Credentials {
        username: "tester".to_string(),
        password: "s3cret".to_string(),
        store_id: Some(1),
    })
}

/// An unconnected session on the scripted server.
pub fn session(server: &SharedServer) -> SessionClient {
    SessionClient::with_connector(test_config(), ScriptedConnector::new(server.clone()))
}

/// A ready session on the scripted server.
pub async fn ready_session(server: &SharedServer) -> SessionClient {
    let mut session = session(server);
    session.connect().await.expect("scripted connect should succeed");
    session
}

// ============================================================================
// Scripted provider
// ============================================================================

/// Provider that replays queued replies and records every request.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ProviderResult<ProviderReply>>>,
    pub requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<ProviderResult<ProviderReply>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn submit(&self, request: &ProviderRequest) -> ProviderResult<ProviderReply> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(text("(no more scripted replies)")))
    }
}

/// A final text reply.
pub fn text(text: &str) -> ProviderReply {
    ProviderReply {
        text: text.to_string(),
        tool_calls: Vec::new(),
        usage: TokenUsage {
            input: 100,
            output: 10,
        },
        stop_reason: Some("end_turn".to_string()),
    }
}

/// A reply requesting tool calls, each given as `(name, input)`.
pub fn calls(text: &str, requested: &[(&str, Value)]) -> ProviderReply {
    ProviderReply {
        text: text.to_string(),
        tool_calls: requested
            .iter()
            .enumerate()
            .map(|(i, (name, input))| RequestedToolCall {
                id: format!("toolu_{}_{}", name, i),
                name: name.to_string(),
                input: input.clone(),
            })
            .collect(),
        usage: TokenUsage {
            input: 100,
            output: 20,
        },
        stop_reason: Some("tool_use".to_string()),
    }
}

pub fn api_error(status: u16) -> ProviderError {
    ProviderError::Api {
        status,
        message: "upstream failure".to_string(),
    }
}
