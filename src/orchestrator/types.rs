//! Data types produced by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::evaluation::EvaluationScore;
use crate::llm::TokenUsage;
use crate::mcp::{result_text, InvocationRecord};

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptRole {
    User,
    Assistant,
    ToolExecution,
}

/// One step of a test conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub timestamp: DateTime<Utc>,
    /// Text for user/assistant turns, tool output or error for executions.
    pub content: String,
    /// Tool name for executions and tool names requested by assistant turns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<String>,
    /// Tool input for executions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Set for steps issued by the setup phase rather than the model.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub setup: bool,
}

impl TranscriptEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TranscriptRole::User,
            timestamp: Utc::now(),
            content: content.into(),
            tool_calls: Vec::new(),
            input: None,
            success: None,
            setup: false,
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<String>) -> Self {
        Self {
            role: TranscriptRole::Assistant,
            timestamp: Utc::now(),
            content: content.into(),
            tool_calls,
            input: None,
            success: None,
            setup: false,
        }
    }

    /// Entry for a tool call made on the model's behalf.
    pub fn execution(execution: &ToolExecution) -> Self {
        Self {
            role: TranscriptRole::ToolExecution,
            timestamp: Utc::now(),
            content: execution.output_text(),
            tool_calls: vec![execution.tool_name.clone()],
            input: Some(execution.input.clone()),
            success: Some(execution.success),
            setup: false,
        }
    }

    /// Entry for a tool call made by the setup phase.
    pub fn setup_step(tool: &str, success: bool, content: impl Into<String>) -> Self {
        Self {
            role: TranscriptRole::ToolExecution,
            timestamp: Utc::now(),
            content: content.into(),
            tool_calls: vec![tool.to_string()],
            input: None,
            success: Some(success),
            setup: true,
        }
    }
}

/// Outcome of one tool call the model requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecution {
    /// Provider-assigned call id.
    pub call_id: String,
    pub tool_name: String,
    pub input: Value,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 1-based tool-call wave this call belonged to.
    pub round: usize,
}

impl ToolExecution {
    /// Text sent back to the model.
    pub fn output_text(&self) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }
        match &self.result {
            Some(result) => result_text(result),
            None => String::new(),
        }
    }
}

/// Metrics computed for one test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestMetrics {
    pub tool_call_count: usize,
    pub total_tool_latency_ms: u64,
    pub error_count: usize,
    /// Tool-call waves actually executed.
    pub rounds: usize,
    pub reasoning_score: f64,
    pub accuracy_score: f64,
    pub token_usage: TokenUsage,
}

/// Everything observed while running one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub success: bool,
    pub transcript: Vec<TranscriptEntry>,
    /// Session invocation records made since `started_at`, setup included.
    pub invocations: Vec<InvocationRecord>,
    pub tool_executions: Vec<ToolExecution>,
    pub metrics: TestMetrics,
    pub final_answer: String,
    pub score: EvaluationScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    /// Wall-clock duration of the test in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.ended_at - self.started_at).num_milliseconds()
    }
}

/// Aggregate figures of a suite run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Passed / total, in [0, 1].
    pub pass_rate: f64,
    pub mean_overall_score: f64,
    /// Mean latency over every tool call of the suite.
    pub mean_tool_latency_ms: f64,
    pub token_usage: TokenUsage,
}

impl SuiteSummary {
    /// Summarize a set of results.
    pub fn from_results(results: &[TestResult]) -> Self {
        let total = results.len();
        if total == 0 {
            return Self::default();
        }

        let passed = results.iter().filter(|r| r.success).count();
        let calls: usize = results.iter().map(|r| r.metrics.tool_call_count).sum();
        let latency: u64 = results.iter().map(|r| r.metrics.total_tool_latency_ms).sum();
        let mut token_usage = TokenUsage::default();
        for result in results {
            token_usage += result.metrics.token_usage;
        }

        Self {
            total,
            passed,
            failed: total - passed,
            pass_rate: passed as f64 / total as f64,
            mean_overall_score: results.iter().map(|r| r.score.overall).sum::<f64>()
                / total as f64,
            mean_tool_latency_ms: if calls == 0 {
                0.0
            } else {
                latency as f64 / calls as f64
            },
            token_usage,
        }
    }
}

/// Results of a suite run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub provider: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub summary: SuiteSummary,
    pub results: Vec<TestResult>,
}
