//! Conversation orchestrator.
//!
//! Drives one test case end-to-end against a ready [`SessionClient`] and an
//! [`LlmProvider`]: prepares the session, sends the prompt with the
//! translated tool catalog, dispatches every requested tool call in order,
//! feeds results back and scores the outcome.
//!
//! ```text
//! prompt → provider ─┬─ no tool calls → final answer → scorer
//!                    └─ tool calls → session (sequential) → results → provider …
//! ```

mod dispatch;
mod types;

pub use types::*;

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::EvaluationConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::evaluation;
use crate::fixtures::TestCase;
use crate::llm::{LlmProvider, ProviderReply, ProviderRequest, TokenUsage, ToolResult};
use crate::mcp::{result_text, KnownTool, SessionClient};
use crate::prompts::system_instruction;
use crate::translator::translate_catalog;

/// Runs test cases one at a time on a shared session.
pub struct Orchestrator {
    session: SessionClient,
    provider: Arc<dyn LlmProvider>,
    config: EvaluationConfig,
}

/// State accumulated while a test runs; survives aborts.
#[derive(Default)]
struct TestRun {
    transcript: Vec<TranscriptEntry>,
    executions: Vec<ToolExecution>,
    usage: TokenUsage,
    rounds: usize,
    final_answer: String,
}

impl TestRun {
    fn record_reply(&mut self, reply: &ProviderReply) {
        self.usage += reply.usage;
        self.final_answer = reply.text.clone();
        self.transcript.push(TranscriptEntry::assistant(
            reply.text.clone(),
            reply.tool_calls.iter().map(|c| c.name.clone()).collect(),
        ));
    }
}

impl Orchestrator {
    /// Bind a ready session and a provider.
    ///
    /// # Errors
    /// Returns `NotReady` if the session has not completed `connect()`.
    pub fn initialize(
        session: SessionClient,
        provider: Arc<dyn LlmProvider>,
        config: EvaluationConfig,
    ) -> OrchestratorResult<Self> {
        if !session.is_ready() {
            return Err(OrchestratorError::NotReady {
                phase: session.phase().to_string(),
            });
        }

        info!(
            provider = provider.name(),
            max_tool_rounds = config.max_tool_rounds,
            "Orchestrator initialized"
        );

        Ok(Self {
            session,
            provider,
            config,
        })
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionClient {
        &mut self.session
    }

    /// Release the session, e.g. to disconnect it.
    pub fn into_session(self) -> SessionClient {
        self.session
    }

    /// Run one test case. Never fails: errors abort the case and are
    /// captured in [`TestResult::error`] alongside the partial data.
    pub async fn execute_test(&mut self, case: &TestCase) -> TestResult {
        let started_at = Utc::now();
        info!(test_id = %case.id, category = %case.category, "Executing test case");

        let mut run = TestRun::default();
        let outcome = self.converse(case, &mut run).await;
        let ended_at = Utc::now();

        let error = match outcome {
            Ok(()) => None,
            Err(e) => {
                warn!(test_id = %case.id, error = %e, "Test case aborted");
                Some(e.to_string())
            }
        };

        let evaluation = evaluation::evaluate(case, &run.executions, &run.final_answer);
        let success = error.is_none() && evaluation.success;

        let metrics = TestMetrics {
            tool_call_count: run.executions.len(),
            total_tool_latency_ms: run.executions.iter().map(|e| e.duration_ms).sum(),
            error_count: run.executions.iter().filter(|e| !e.success).count(),
            rounds: run.rounds,
            reasoning_score: evaluation.score.reasoning,
            accuracy_score: evaluation.score.accuracy,
            token_usage: run.usage,
        };

        info!(
            test_id = %case.id,
            success,
            overall = evaluation.score.overall,
            tool_calls = metrics.tool_call_count,
            "Test case finished"
        );

        TestResult {
            test_id: case.id.clone(),
            started_at,
            ended_at,
            success,
            invocations: self.session.call_history_since(started_at),
            transcript: run.transcript,
            tool_executions: run.executions,
            metrics,
            final_answer: run.final_answer,
            score: evaluation.score,
            error,
        }
    }

    /// Run cases sequentially on the shared session.
    pub async fn run_suite(&mut self, cases: &[TestCase]) -> SuiteReport {
        let started_at = Utc::now();
        let mut results = Vec::with_capacity(cases.len());

        for (index, case) in cases.iter().enumerate() {
            info!(
                test_id = %case.id,
                index = index + 1,
                total = cases.len(),
                "Running suite case"
            );
            results.push(self.execute_test(case).await);
        }

        let summary = SuiteSummary::from_results(&results);
        info!(
            total = summary.total,
            passed = summary.passed,
            mean_score = summary.mean_overall_score,
            "Suite finished"
        );

        SuiteReport {
            provider: self.provider.name().to_string(),
            started_at,
            ended_at: Utc::now(),
            summary,
            results,
        }
    }

    async fn converse(&mut self, case: &TestCase, run: &mut TestRun) -> OrchestratorResult<()> {
        self.prepare_session(case, run).await?;

        let tools = translate_catalog(&self.session.tools_or_refresh().await?);
        let mut request =
            ProviderRequest::new(system_instruction(&tools), tools).with_user_message(&case.prompt);
        run.transcript.push(TranscriptEntry::user(case.prompt.clone()));

        let mut reply = self.provider.submit(&request).await?;
        run.record_reply(&reply);

        let max_rounds = self.config.max_tool_rounds.max(1) as usize;
        while !reply.tool_calls.is_empty() {
            if run.rounds >= max_rounds {
                warn!(
                    test_id = %case.id,
                    pending_calls = reply.tool_calls.len(),
                    max_rounds,
                    "Tool round limit reached, not following further tool calls"
                );
                break;
            }
            run.rounds += 1;

            let mut results = Vec::with_capacity(reply.tool_calls.len());
            let mut auth_changed = false;
            for call in &reply.tool_calls {
                let execution = self.dispatch(call, run.rounds).await?;
                auth_changed |= KnownTool::from_name(&call.name).is_some_and(|t| t.changes_auth());

                results.push(ToolResult {
                    call_id: call.id.clone(),
                    content: execution.output_text(),
                    is_error: !execution.success,
                });
                run.transcript.push(TranscriptEntry::execution(&execution));
                run.executions.push(execution);
            }

            if auth_changed {
                self.refresh_catalog(&mut request).await?;
            }

            reply = self
                .provider
                .continue_with_results(&mut request, &reply, &results)
                .await?;
            run.record_reply(&reply);
        }

        Ok(())
    }

    /// Bring the session into the auth state the case requires.
    async fn prepare_session(&mut self, case: &TestCase, run: &mut TestRun) -> OrchestratorResult<()> {
        let Some(setup) = case.setup else {
            return Ok(());
        };

        let authenticated = self.session.is_authenticated();
        let step = if setup.ensure_logged_out && authenticated {
            KnownTool::CloseSession
        } else if setup.ensure_logged_in && !authenticated {
            KnownTool::Authenticate
        } else {
            return Ok(());
        };

        info!(test_id = %case.id, tool = %step, "Setup: adjusting session auth state");
        let outcome = match step {
            KnownTool::CloseSession => self.session.close_session().await,
            _ => self.session.authenticate(None).await,
        };

        match outcome {
            Ok(result) => {
                run.transcript.push(TranscriptEntry::setup_step(
                    step.name(),
                    true,
                    result_text(&result),
                ));
            }
            Err(e) => {
                run.transcript
                    .push(TranscriptEntry::setup_step(step.name(), false, e.to_string()));
                return Err(e.into());
            }
        }

        self.session.discover_tools().await?;
        Ok(())
    }

    /// Re-discover tools after an auth change and resend the new catalog.
    async fn refresh_catalog(&mut self, request: &mut ProviderRequest) -> OrchestratorResult<()> {
        match self.session.discover_tools().await {
            Ok(tools) => {
                request.tools = translate_catalog(&tools);
                request.system_instruction = system_instruction(&request.tools);
                Ok(())
            }
            Err(e) if e.is_not_ready() => Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Tool refresh after auth change failed, keeping previous catalog");
                Ok(())
            }
        }
    }
}
