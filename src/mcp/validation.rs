//! Parameter validation applied before any call reaches the transport.

use serde_json::{Map, Value};

use super::catalog::{KnownTool, SchemaCategory};
use crate::error::{SessionError, SessionResult};

/// Longest accepted search keyword, in characters.
pub const MAX_KEYWORD_LENGTH: usize = 100;

/// Validate the parameters for a known tool.
pub fn validate_parameters(tool: KnownTool, params: &Map<String, Value>) -> SessionResult<()> {
    match tool {
        KnownTool::GetCurrentDate | KnownTool::CloseSession => Ok(()),
        KnownTool::Authenticate => {
            let store_id = params.get("store_id").ok_or_else(|| {
                SessionError::invalid_input(tool.name(), "store_id", "is required")
            })?;
            validate_store_id(store_id)?;
            for field in ["username", "password"] {
                if let Some(value) = params.get(field) {
                    if !value.is_string() {
                        return Err(SessionError::invalid_input(
                            tool.name(),
                            field,
                            "must be a string",
                        ));
                    }
                }
            }
            Ok(())
        }
        KnownTool::ExploreSchema => {
            let category = require_str(tool, params, "category")?;
            category
                .parse::<SchemaCategory>()
                .map(|_| ())
                .map_err(|reason| SessionError::invalid_input(tool.name(), "category", reason))
        }
        KnownTool::SearchSchema => validate_keyword(require_str(tool, params, "keyword")?),
        KnownTool::DescribeType => {
            let type_name = require_str(tool, params, "type_name")?;
            if type_name.trim().is_empty() {
                return Err(SessionError::invalid_input(
                    tool.name(),
                    "type_name",
                    "cannot be empty",
                ));
            }
            Ok(())
        }
        KnownTool::ExecuteGraphql => {
            let query = require_str(tool, params, "query")?;
            if query.trim().is_empty() {
                return Err(SessionError::invalid_input(
                    tool.name(),
                    "query",
                    "cannot be empty",
                ));
            }
            match params.get("variables") {
                None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
                Some(_) => Err(SessionError::invalid_input(
                    tool.name(),
                    "variables",
                    "must be an object",
                )),
            }
        }
    }
}

/// Rewrite validated parameters into the exact form the server expects.
///
/// Categories are matched leniently, so the canonical name replaces
/// whatever spelling the caller used.
pub fn normalize_parameters(tool: KnownTool, params: &mut Map<String, Value>) {
    if tool != KnownTool::ExploreSchema {
        return;
    }
    let canonical = params
        .get("category")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<SchemaCategory>().ok());
    if let Some(category) = canonical {
        params.insert("category".to_string(), Value::from(category.as_str()));
    }
}

/// Validate a free-text search keyword.
pub fn validate_keyword(keyword: &str) -> SessionResult<()> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        return Err(SessionError::invalid_input(
            KnownTool::SearchSchema.name(),
            "keyword",
            "cannot be empty",
        ));
    }
    if trimmed.chars().count() > MAX_KEYWORD_LENGTH {
        return Err(SessionError::invalid_input(
            KnownTool::SearchSchema.name(),
            "keyword",
            format!("cannot exceed {} characters", MAX_KEYWORD_LENGTH),
        ));
    }
    Ok(())
}

/// Validate a store identifier: a JSON integer greater than zero.
pub fn validate_store_id(value: &Value) -> SessionResult<i64> {
    let invalid = |reason: &str| {
        SessionError::invalid_input(KnownTool::Authenticate.name(), "store_id", reason)
    };

    match value {
        Value::Number(n) => match n.as_i64() {
            Some(id) if id > 0 => Ok(id),
            Some(_) => Err(invalid("must be a positive integer")),
            None if n.is_u64() => Err(invalid("is out of range")),
            None => Err(invalid("must be an integer")),
        },
        _ => Err(invalid("must be an integer")),
    }
}

fn require_str<'a>(
    tool: KnownTool,
    params: &'a Map<String, Value>,
    field: &str,
) -> SessionResult<&'a str> {
    match params.get(field) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(SessionError::invalid_input(
            tool.name(),
            field,
            "must be a string",
        )),
        None => Err(SessionError::invalid_input(tool.name(), field, "is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_explore_schema_category() {
        assert!(validate_parameters(KnownTool::ExploreSchema, &params(json!({"category": "queries"}))).is_ok());

        let err = validate_parameters(KnownTool::ExploreSchema, &params(json!({"category": "products"})))
            .unwrap_err();
        assert!(err.is_invalid_input());

        let err = validate_parameters(KnownTool::ExploreSchema, &params(json!({}))).unwrap_err();
        assert!(err.to_string().contains("is required"));
    }

    #[test]
    fn test_normalize_category_to_canonical_name() {
        let mut input = params(json!({"category": " Queries "}));
        validate_parameters(KnownTool::ExploreSchema, &input).unwrap();
        normalize_parameters(KnownTool::ExploreSchema, &mut input);
        assert_eq!(input["category"], "queries");

        let mut other = params(json!({"keyword": " Order "}));
        normalize_parameters(KnownTool::SearchSchema, &mut other);
        assert_eq!(other["keyword"], " Order ");
    }

    #[test]
    fn test_search_keyword_bounds() {
        assert!(validate_keyword("product").is_ok());
        assert!(validate_keyword("").unwrap_err().is_invalid_input());
        assert!(validate_keyword("   \t").unwrap_err().is_invalid_input());

        let at_limit = "a".repeat(MAX_KEYWORD_LENGTH);
        assert!(validate_keyword(&at_limit).is_ok());
        let over = "a".repeat(MAX_KEYWORD_LENGTH + 1);
        assert!(validate_keyword(&over).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_store_id_rules() {
        assert_eq!(validate_store_id(&json!(7)).unwrap(), 7);
        assert!(validate_store_id(&json!(0)).is_err());
        assert!(validate_store_id(&json!(-3)).is_err());
        assert!(validate_store_id(&json!(1.5)).is_err());
        assert!(validate_store_id(&json!("7")).is_err());
        assert!(validate_store_id(&json!(null)).is_err());
    }

    #[test]
    fn test_authenticate_requires_store_id() {
        let err = validate_parameters(KnownTool::Authenticate, &params(json!({"username": "a"})))
            .unwrap_err();
        assert!(err.is_invalid_input());

        let err = validate_parameters(
            KnownTool::Authenticate,
            &params(json!({"store_id": 1, "password": 42})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_execute_graphql_rules() {
        assert!(validate_parameters(
            KnownTool::ExecuteGraphql,
            &params(json!({"query": "{ shop { name } }", "variables": {"id": 1}}))
        )
        .is_ok());
        assert!(validate_parameters(KnownTool::ExecuteGraphql, &params(json!({"query": "  "}))).is_err());
        assert!(validate_parameters(
            KnownTool::ExecuteGraphql,
            &params(json!({"query": "{ a }", "variables": [1, 2]}))
        )
        .is_err());
    }

    #[test]
    fn test_parameterless_tools_accept_anything() {
        assert!(validate_parameters(KnownTool::GetCurrentDate, &Map::new()).is_ok());
        assert!(validate_parameters(KnownTool::CloseSession, &params(json!({"extra": true}))).is_ok());
    }
}
