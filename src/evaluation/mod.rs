//! Rule-based scoring of an executed test case.
//!
//! Three sub-scores are computed independently and clamped to [0, 100]:
//! reasoning (were the right tools called), accuracy (did parameters match,
//! did calls succeed) and efficiency (call count and latency). The
//! pass/fail verdict is a separate, stricter check: a test can score well
//! and still fail, e.g. when it made no tool calls at all.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fixtures::TestCase;
use crate::orchestrator::ToolExecution;

const MISSING_TOOL_PENALTY: f64 = 20.0;
const UNEXPECTED_TOOL_PENALTY: f64 = 10.0;
const EXCESS_CALL_PENALTY: f64 = 5.0;
const PARAM_MISMATCH_PENALTY: f64 = 10.0;
const FAILED_CALL_PENALTY: f64 = 15.0;
const CALL_BUDGET: usize = 5;
const OVER_BUDGET_PENALTY: f64 = 10.0;
const SLOW_LATENCY_MS: f64 = 5000.0;
const SLOW_PENALTY: f64 = 20.0;
const SLUGGISH_LATENCY_MS: f64 = 2000.0;
const SLUGGISH_PENALTY: f64 = 10.0;

/// Sub-scores and weighted overall score of one test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScore {
    pub reasoning: f64,
    pub accuracy: f64,
    pub efficiency: f64,
    /// True when no tool call failed (vacuously true with zero calls).
    pub all_calls_succeeded: bool,
    pub overall: f64,
}

/// Score and verdict together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub success: bool,
    pub score: EvaluationScore,
}

/// Score a finished test and decide pass/fail.
pub fn evaluate(case: &TestCase, executions: &[ToolExecution], final_answer: &str) -> Evaluation {
    Evaluation {
        success: is_success(case, executions, final_answer),
        score: score(case, executions),
    }
}

/// Compute all sub-scores and the weighted overall score.
pub fn score(case: &TestCase, executions: &[ToolExecution]) -> EvaluationScore {
    let reasoning = reasoning_score(case, executions);
    let accuracy = accuracy_score(case, executions);
    let efficiency = efficiency_score(executions);
    let all_calls_succeeded = executions.iter().all(|e| e.success);

    let overall = 0.3 * reasoning
        + 0.3 * accuracy
        + 0.2 * efficiency
        + 0.2 * if all_calls_succeeded { 100.0 } else { 0.0 };

    EvaluationScore {
        reasoning,
        accuracy,
        efficiency,
        all_calls_succeeded,
        overall,
    }
}

/// Were the expected tools called, and nothing else?
///
/// Tool names are compared as sets. The count penalty applies only when an
/// expected call count was declared.
pub fn reasoning_score(case: &TestCase, executions: &[ToolExecution]) -> f64 {
    let called: BTreeSet<&str> = executions.iter().map(|e| e.tool_name.as_str()).collect();
    let mut score = 100.0;

    if let Some(expected) = &case.expected_tools {
        let expected: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
        let missing = expected.difference(&called).count();
        let unexpected = called.difference(&expected).count();
        score -= MISSING_TOOL_PENALTY * missing as f64;
        score -= UNEXPECTED_TOOL_PENALTY * unexpected as f64;
    }

    if let Some(limit) = case.expected_call_count {
        let excess = executions.len().saturating_sub(limit);
        score -= EXCESS_CALL_PENALTY * excess as f64;
    }

    clamp(score)
}

/// Did parameters match expectations, and did the calls succeed?
///
/// When a tool was called several times, the call with the fewest
/// mismatches is the one compared.
pub fn accuracy_score(case: &TestCase, executions: &[ToolExecution]) -> f64 {
    let mut score = 100.0;

    if let Some(expected_params) = &case.expected_params {
        for (tool, expected) in expected_params {
            let best = executions
                .iter()
                .filter(|e| &e.tool_name == tool)
                .map(|e| param_mismatches(expected, &e.input))
                .min();
            if let Some(mismatches) = best {
                score -= PARAM_MISMATCH_PENALTY * mismatches as f64;
            }
        }
    }

    let failed = executions.iter().filter(|e| !e.success).count();
    score -= FAILED_CALL_PENALTY * failed as f64;

    clamp(score)
}

/// Penalize more than five calls and slow mean latency.
pub fn efficiency_score(executions: &[ToolExecution]) -> f64 {
    let mut score = 100.0;

    let over_budget = executions.len().saturating_sub(CALL_BUDGET);
    score -= OVER_BUDGET_PENALTY * over_budget as f64;

    if !executions.is_empty() {
        let total: u64 = executions.iter().map(|e| e.duration_ms).sum();
        let mean = total as f64 / executions.len() as f64;
        if mean > SLOW_LATENCY_MS {
            score -= SLOW_PENALTY;
        } else if mean > SLUGGISH_LATENCY_MS {
            score -= SLUGGISH_PENALTY;
        }
    }

    clamp(score)
}

/// Pass only if at least one call was made, all succeeded, the answer is
/// non-empty and every expected tool was called.
pub fn is_success(case: &TestCase, executions: &[ToolExecution], final_answer: &str) -> bool {
    if executions.is_empty() {
        return false;
    }
    if !executions.iter().all(|e| e.success) {
        return false;
    }
    if final_answer.trim().is_empty() {
        return false;
    }
    case.expected_tool_names()
        .iter()
        .all(|name| executions.iter().any(|e| &e.tool_name == name))
}

fn param_mismatches(expected: &Map<String, Value>, actual: &Value) -> usize {
    expected
        .iter()
        .filter(|(field, want)| match actual.get(field.as_str()) {
            Some(got) => !values_match(want, got),
            None => true,
        })
        .count()
}

/// Numbers compare numerically; strings compare trimmed and case-insensitively.
fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::String(a), Value::String(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => expected == actual,
    }
}

fn clamp(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}
