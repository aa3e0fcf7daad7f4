//! Built-in test cases covering each tool of the catalog.

use serde_json::json;

use super::types::{Complexity, TestCase};

/// Date lookup: the simplest possible single-tool case.
pub fn current_date_case() -> TestCase {
    TestCase::new("date-001", "What's today's date?")
        .with_category("basic")
        .expect_tools(["get_current_date"])
        .expect_call_count(1)
}

/// Schema exploration of the query root.
pub fn explore_queries_case() -> TestCase {
    TestCase::new(
        "schema-001",
        "What queries are available in the GraphQL schema?",
    )
    .with_category("schema")
    .expect_tools(["explore_schema"])
    .expect_call_count(1)
    .expect_params("explore_schema", json!({"category": "queries"}))
}

/// Keyword search over the schema.
pub fn search_schema_case() -> TestCase {
    TestCase::new(
        "schema-002",
        "Find everything in the schema related to orders.",
    )
    .with_category("schema")
    .expect_tools(["search_schema"])
    .expect_call_count(2)
    .expect_params("search_schema", json!({"keyword": "order"}))
}

/// Describe a single type.
pub fn describe_type_case() -> TestCase {
    TestCase::new("schema-003", "What fields does the Product type have?")
        .with_category("schema")
        .with_complexity(Complexity::Moderate)
        .expect_tools(["describe_type"])
        .expect_call_count(2)
        .expect_params("describe_type", json!({"type_name": "Product"}))
}

/// Log in from a logged-out session.
pub fn authenticate_case() -> TestCase {
    TestCase::new("auth-001", "Log me into store 1.")
        .with_category("auth")
        .with_complexity(Complexity::Moderate)
        .expect_tools(["authenticate"])
        .expect_call_count(1)
        .expect_params("authenticate", json!({"store_id": 1}))
        .logged_out()
}

/// Log out from an authenticated session.
pub fn logout_case() -> TestCase {
    TestCase::new("auth-002", "Please log me out of the store.")
        .with_category("auth")
        .expect_tools(["close_session"])
        .expect_call_count(1)
        .logged_in()
}

/// Schema discovery followed by a freeform query.
pub fn freeform_query_case() -> TestCase {
    TestCase::new(
        "query-001",
        "List the names of the first five products in the catalog.",
    )
    .with_category("graphql")
    .with_complexity(Complexity::Complex)
    .expect_tools(["explore_schema", "execute_graphql"])
    .expect_call_count(4)
    .logged_in()
}

/// All built-in cases in registration order.
pub fn all() -> Vec<TestCase> {
    vec![
        current_date_case(),
        explore_queries_case(),
        search_schema_case(),
        describe_type_case(),
        authenticate_case(),
        logout_case(),
        freeform_query_case(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::KnownTool;

    #[test]
    fn test_builtin_ids_are_unique() {
        let cases = all();
        let mut ids: Vec<&str> = cases.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), cases.len());
    }

    #[test]
    fn test_builtins_only_expect_known_tools() {
        for case in all() {
            for name in case.expected_tool_names() {
                assert!(
                    KnownTool::from_name(name).is_some(),
                    "{} expects unknown tool {}",
                    case.id,
                    name
                );
            }
        }
    }
}
