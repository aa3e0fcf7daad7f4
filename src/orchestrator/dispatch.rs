//! Tool-call dispatch: the explicit mapping from model-requested tool names
//! to session calls.

use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{Orchestrator, ToolExecution};
use crate::error::{OrchestratorError, OrchestratorResult, SessionError, SessionResult};
use crate::llm::RequestedToolCall;
use crate::mcp::{validate_store_id, KnownTool};

impl Orchestrator {
    /// Execute one requested call.
    ///
    /// Failures of the call itself (unknown tool, rejected parameters, tool
    /// errors) become an unsuccessful [`ToolExecution`] so the model can
    /// react. Only a session that is no longer ready aborts the test.
    pub(super) async fn dispatch(
        &mut self,
        call: &RequestedToolCall,
        round: usize,
    ) -> OrchestratorResult<ToolExecution> {
        debug!(tool = %call.name, call_id = %call.id, round, "Dispatching tool call");

        let start = Instant::now();
        let outcome = match KnownTool::from_name(&call.name) {
            Some(tool) => match arguments(tool, &call.input) {
                Ok(params) => self.call_known(tool, &params).await.map_err(Into::into),
                Err(e) => Err(e.into()),
            },
            None => Err(OrchestratorError::UnknownTool {
                tool_name: call.name.clone(),
            }),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let mut execution = ToolExecution {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            input: call.input.clone(),
            success: false,
            duration_ms,
            result: None,
            error: None,
            round,
        };

        match outcome {
            Ok(result) => {
                execution.success = true;
                execution.result = Some(result);
            }
            Err(OrchestratorError::Session(e)) if e.is_not_ready() => {
                return Err(OrchestratorError::Session(e));
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call failed");
                execution.error = Some(e.to_string());
            }
        }

        Ok(execution)
    }

    async fn call_known(&mut self, tool: KnownTool, params: &Map<String, Value>) -> SessionResult<Value> {
        let session = &mut self.session;
        match tool {
            KnownTool::GetCurrentDate => session.get_current_date().await,
            KnownTool::Authenticate => {
                let store_id = params.get("store_id").map(validate_store_id).transpose()?;
                session.authenticate(store_id).await
            }
            KnownTool::CloseSession => session.close_session().await,
            KnownTool::ExploreSchema => {
                session
                    .explore_schema(str_arg(tool, params, "category")?)
                    .await
            }
            KnownTool::SearchSchema => {
                session
                    .search_schema(str_arg(tool, params, "keyword")?)
                    .await
            }
            KnownTool::DescribeType => {
                session
                    .describe_type(str_arg(tool, params, "type_name")?)
                    .await
            }
            KnownTool::ExecuteGraphql => {
                let variables = params.get("variables").filter(|v| !v.is_null()).cloned();
                session
                    .execute_graphql(str_arg(tool, params, "query")?, variables)
                    .await
            }
        }
    }
}

/// Tool input as a parameter map. `null` is treated as no parameters.
fn arguments(tool: KnownTool, input: &Value) -> SessionResult<Map<String, Value>> {
    match input {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        _ => Err(SessionError::invalid_input(
            tool.name(),
            "input",
            "must be a JSON object",
        )),
    }
}

fn str_arg<'a>(tool: KnownTool, params: &'a Map<String, Value>, field: &str) -> SessionResult<&'a str> {
    match params.get(field) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(SessionError::invalid_input(tool.name(), field, "must be a string")),
        None => Err(SessionError::invalid_input(tool.name(), field, "is required")),
    }
}
