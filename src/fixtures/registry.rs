//! Registry of test cases.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use super::builtins;
use super::types::TestCase;
use crate::error::{AppError, AppResult};

/// Ordered collection of test cases with unique ids.
///
/// Built-in cases are registered on creation; cases keep their
/// registration order so suites run deterministically.
#[derive(Debug, Clone)]
pub struct FixtureRegistry {
    cases: Vec<TestCase>,
}

/// Accepted fixture file shapes: a bare array or `{"testCases": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    List(Vec<TestCase>),
    Wrapped {
        #[serde(rename = "testCases")]
        test_cases: Vec<TestCase>,
    },
}

impl FixtureRegistry {
    /// Create a registry with the built-in cases.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for case in builtins::all() {
            let id = case.id.clone();
            if let Err(e) = registry.register(case) {
                error!(
                    fixture = %id,
                    error = %e,
                    "Failed to register builtin fixture"
                );
            }
        }
        registry
    }

    /// Create a registry without any cases.
    pub fn empty() -> Self {
        Self { cases: Vec::new() }
    }

    /// Register a case.
    ///
    /// # Errors
    /// Returns an error if the id or prompt is blank or the id is taken.
    pub fn register(&mut self, case: TestCase) -> AppResult<()> {
        if case.id.trim().is_empty() {
            return Err(fixture_error("Test case ID is required"));
        }
        if case.prompt.trim().is_empty() {
            return Err(fixture_error(format!(
                "Test case '{}' has an empty prompt",
                case.id
            )));
        }
        if self.get(&case.id).is_some() {
            return Err(fixture_error(format!(
                "Test case '{}' already exists",
                case.id
            )));
        }

        self.cases.push(case);
        Ok(())
    }

    /// Get a case by id.
    pub fn get(&self, id: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.id == id)
    }

    /// List cases in registration order, optionally filtered by category.
    pub fn list(&self, category: Option<&str>) -> Vec<TestCase> {
        self.cases
            .iter()
            .filter(|c| category.map_or(true, |cat| c.category == cat))
            .cloned()
            .collect()
    }

    /// Unique categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut cats: Vec<String> = self.cases.iter().map(|c| c.category.clone()).collect();
        cats.sort();
        cats.dedup();
        cats
    }

    pub fn count(&self) -> usize {
        self.cases.len()
    }

    /// Load and register every case of a JSON fixture file.
    ///
    /// Returns the number of cases added. Either every case in the file is
    /// registered or, on the first invalid case, none are.
    pub fn load_json_file(&mut self, path: impl AsRef<Path>) -> AppResult<usize> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            fixture_error(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let parsed: FixtureFile = serde_json::from_str(&raw).map_err(|e| {
            fixture_error(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        let cases = match parsed {
            FixtureFile::List(cases) => cases,
            FixtureFile::Wrapped { test_cases } => test_cases,
        };

        let count = cases.len();
        let mut staged = self.clone();
        for case in cases {
            staged.register(case)?;
        }
        *self = staged;

        info!(path = %path.display(), count, "Loaded fixture file");
        Ok(count)
    }
}

impl Default for FixtureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn fixture_error(message: impl Into<String>) -> AppError {
    AppError::Fixture {
        message: message.into(),
    }
}
