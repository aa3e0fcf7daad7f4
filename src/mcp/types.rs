//! Data types shared by the session client: tool descriptors, their
//! parameter schemas, invocation records and connection state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Schema description of one invocable tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    /// Unique tool name within a session.
    pub name: String,
    /// Human-readable description, if the server provided one.
    pub description: Option<String>,
    /// Top-level parameters in server order.
    pub parameters: Vec<ParamField>,
}

/// A named parameter of a tool or nested object.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamField {
    pub name: String,
    pub schema: ParamSchema,
    pub required: bool,
}

/// Schema of a single value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSchema {
    pub kind: SchemaType,
    pub description: Option<String>,
    /// Allowed values, in declaration order.
    pub enum_values: Option<Vec<Value>>,
}

/// Shape of a schema value.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<ParamSchema>),
    Object(Vec<ParamField>),
    /// Union of alternative schemas.
    OneOf(Vec<ParamSchema>),
    /// No usable type information.
    Any,
}

impl ToolDescriptor {
    /// Create a descriptor with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a parameter.
    pub fn with_parameter(mut self, field: ParamField) -> Self {
        self.parameters.push(field);
        self
    }

    /// Build a descriptor from a JSON Schema `inputSchema` object.
    ///
    /// Never fails: unrecognized constructs degrade to [`SchemaType::Any`].
    pub fn from_json_schema(
        name: impl Into<String>,
        description: Option<String>,
        input_schema: &Value,
    ) -> Self {
        let parameters = match ParamSchema::from_json(input_schema).kind {
            SchemaType::Object(fields) => fields,
            _ => Vec::new(),
        };

        Self {
            name: name.into(),
            description: description.filter(|d| !d.trim().is_empty()),
            parameters,
        }
    }

    /// Look up a top-level parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParamField> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

impl ParamField {
    pub fn new(name: impl Into<String>, schema: ParamSchema, required: bool) -> Self {
        Self {
            name: name.into(),
            schema,
            required,
        }
    }

    pub fn required(name: impl Into<String>, schema: ParamSchema) -> Self {
        Self::new(name, schema, true)
    }

    pub fn optional(name: impl Into<String>, schema: ParamSchema) -> Self {
        Self::new(name, schema, false)
    }
}

impl ParamSchema {
    pub fn new(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            enum_values: None,
        }
    }

    pub fn string() -> Self {
        Self::new(SchemaType::String)
    }

    pub fn integer() -> Self {
        Self::new(SchemaType::Integer)
    }

    pub fn object(fields: Vec<ParamField>) -> Self {
        Self::new(SchemaType::Object(fields))
    }

    pub fn array(items: ParamSchema) -> Self {
        Self::new(SchemaType::Array(Box::new(items)))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    /// Parse one JSON Schema node.
    pub fn from_json(value: &Value) -> Self {
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let enum_values = value.get("enum").and_then(Value::as_array).cloned();

        let kind = if let Some(variants) = value
            .get("oneOf")
            .or_else(|| value.get("anyOf"))
            .and_then(Value::as_array)
        {
            SchemaType::OneOf(variants.iter().map(ParamSchema::from_json).collect())
        } else {
            match declared_type(value) {
                Some("string") => SchemaType::String,
                Some("integer") => SchemaType::Integer,
                Some("number") => SchemaType::Number,
                Some("boolean") => SchemaType::Boolean,
                Some("array") => SchemaType::Array(Box::new(items_of(value))),
                Some("object") => SchemaType::Object(properties_of(value)),
                Some(_) => SchemaType::Any,
                None if value.get("properties").is_some() => {
                    SchemaType::Object(properties_of(value))
                }
                None if value.get("items").is_some() => {
                    SchemaType::Array(Box::new(items_of(value)))
                }
                None if enum_values.is_some() => SchemaType::String,
                None => SchemaType::Any,
            }
        };

        Self {
            kind,
            description,
            enum_values,
        }
    }
}

/// The first non-null entry of `type` (which may be a string or a list).
fn declared_type(value: &Value) -> Option<&str> {
    match value.get("type")? {
        Value::String(t) => Some(t.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

fn items_of(value: &Value) -> ParamSchema {
    value
        .get("items")
        .map(ParamSchema::from_json)
        .unwrap_or_else(|| ParamSchema::new(SchemaType::Any))
}

fn properties_of(value: &Value) -> Vec<ParamField> {
    let required: Vec<&str> = value
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    value
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, schema)| ParamField {
                    name: name.clone(),
                    schema: ParamSchema::from_json(schema),
                    required: required.contains(&name.as_str()),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Immutable log entry for one attempted tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Unique record identifier.
    pub id: String,
    /// Tool name (or `tools/list` for discovery).
    pub tool_name: String,
    /// Parameters as sent, with secrets redacted.
    pub parameters: Map<String, Value>,
    /// When the call was submitted.
    pub submitted_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Whether the call succeeded.
    pub success: bool,
    /// Result payload (if successful).
    pub result: Option<Value>,
    /// Error description (if failed).
    pub error: Option<String>,
}

impl InvocationRecord {
    /// Start a record stamped with the current time.
    pub fn new(tool_name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tool_name: tool_name.into(),
            parameters,
            submitted_at: Utc::now(),
            duration_ms: 0,
            success: false,
            result: None,
            error: None,
        }
    }

    /// Finish as successful with output
    pub fn succeeded(mut self, result: Value, duration_ms: u64) -> Self {
        self.success = true;
        self.result = Some(result);
        self.duration_ms = duration_ms;
        self
    }

    /// Finish as failed with error
    pub fn failed(mut self, error: impl Into<String>, duration_ms: u64) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self.duration_ms = duration_ms;
        self
    }
}

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    /// Transport is up but the discovery probe has not completed.
    Connected,
    Ready,
}

impl SessionPhase {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Disconnected => "disconnected",
            SessionPhase::Connecting => "connecting",
            SessionPhase::Connected => "connected",
            SessionPhase::Ready => "ready",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a session's connection state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub phase: SessionPhase,
    pub connected: bool,
    pub initialized: bool,
    pub authenticated: bool,
    pub tool_count: usize,
    pub connected_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_from_json_schema_preserves_order_and_required() {
        let schema = json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "GraphQL document" },
                "variables": { "type": "object", "properties": {} },
                "limit": { "type": "integer" }
            },
            "required": ["query"]
        });

        let tool = ToolDescriptor::from_json_schema(
            "execute_graphql",
            Some("Run a query".to_string()),
            &schema,
        );

        let names: Vec<&str> = tool.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["query", "variables", "limit"]);
        assert!(tool.parameter("query").unwrap().required);
        assert!(!tool.parameter("limit").unwrap().required);
        assert_eq!(
            tool.parameter("query").unwrap().schema.description.as_deref(),
            Some("GraphQL document")
        );
    }

    #[test]
    fn test_blank_description_is_dropped() {
        let tool = ToolDescriptor::from_json_schema("x", Some("   ".to_string()), &json!({}));
        assert!(tool.description.is_none());
        assert!(tool.parameters.is_empty());
    }

    #[test]
    fn test_param_schema_nested_types() {
        let schema = ParamSchema::from_json(&json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": { "id": { "type": "integer" } },
                "required": ["id"]
            }
        }));

        match schema.kind {
            SchemaType::Array(items) => match items.kind {
                SchemaType::Object(fields) => {
                    assert_eq!(fields.len(), 1);
                    assert_eq!(fields[0].name, "id");
                    assert_eq!(fields[0].schema.kind, SchemaType::Integer);
                    assert!(fields[0].required);
                }
                other => panic!("expected object items, got {:?}", other),
            },
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_param_schema_union_and_nullable() {
        let schema = ParamSchema::from_json(&json!({
            "anyOf": [{ "type": "string" }, { "type": "integer" }]
        }));
        assert_eq!(
            schema.kind,
            SchemaType::OneOf(vec![ParamSchema::string(), ParamSchema::integer()])
        );

        let nullable = ParamSchema::from_json(&json!({ "type": ["null", "boolean"] }));
        assert_eq!(nullable.kind, SchemaType::Boolean);
    }

    #[test]
    fn test_param_schema_untyped_enum_is_string() {
        let schema = ParamSchema::from_json(&json!({ "enum": ["a", "b"] }));
        assert_eq!(schema.kind, SchemaType::String);
        assert_eq!(schema.enum_values, Some(vec![json!("a"), json!("b")]));

        let unknown = ParamSchema::from_json(&json!({ "type": "date-time" }));
        assert_eq!(unknown.kind, SchemaType::Any);
    }

    #[test]
    fn test_invocation_record_builders() {
        let record = InvocationRecord::new("search_schema", Map::new())
            .succeeded(json!({"hits": 2}), 42);
        assert!(record.success);
        assert_eq!(record.duration_ms, 42);
        assert!(record.error.is_none());

        let record = InvocationRecord::new("search_schema", Map::new()).failed("boom", 7);
        assert!(!record.success);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.result.is_none());
    }

    #[test]
    fn test_session_phase_display() {
        assert_eq!(SessionPhase::Ready.to_string(), "ready");
        assert_eq!(
            serde_json::to_value(SessionPhase::Disconnected).unwrap(),
            json!("disconnected")
        );
    }
}
