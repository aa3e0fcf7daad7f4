//! Test case data model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One scripted evaluation case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Unique identifier (e.g., "date-001").
    pub id: String,
    /// Natural-language prompt sent to the model.
    pub prompt: String,
    /// Tool names the model is expected to call, in expected order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_tools: Option<Vec<String>>,
    /// Upper bound on the number of tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_call_count: Option<usize>,
    /// Expected parameter values, keyed by tool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_params: Option<HashMap<String, Map<String, Value>>>,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default = "default_category")]
    pub category: String,
    /// Session state required before the prompt is sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<TestSetup>,
}

fn default_category() -> String {
    "general".to_string()
}

/// Difficulty tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Simple,
    Moderate,
    Complex,
}

/// Setup requirement for a test case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSetup {
    #[serde(default)]
    pub ensure_logged_in: bool,
    #[serde(default)]
    pub ensure_logged_out: bool,
}

impl TestCase {
    /// Create a case with no expectations.
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            expected_tools: None,
            expected_call_count: None,
            expected_params: None,
            complexity: Complexity::default(),
            category: default_category(),
            setup: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    /// Expect these tools to be called.
    pub fn expect_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn expect_call_count(mut self, count: usize) -> Self {
        self.expected_call_count = Some(count);
        self
    }

    /// Expect parameter values for one tool. Non-object values are ignored.
    pub fn expect_params(mut self, tool: impl Into<String>, params: Value) -> Self {
        if let Value::Object(map) = params {
            self.expected_params
                .get_or_insert_with(HashMap::new)
                .insert(tool.into(), map);
        }
        self
    }

    /// Require an authenticated session before the prompt.
    pub fn logged_in(mut self) -> Self {
        self.setup = Some(TestSetup {
            ensure_logged_in: true,
            ensure_logged_out: false,
        });
        self
    }

    /// Require an unauthenticated session before the prompt.
    pub fn logged_out(mut self) -> Self {
        self.setup = Some(TestSetup {
            ensure_logged_in: false,
            ensure_logged_out: true,
        });
        self
    }

    /// Declared expected tool names, or an empty slice.
    pub fn expected_tool_names(&self) -> &[String] {
        self.expected_tools.as_deref().unwrap_or(&[])
    }
}
