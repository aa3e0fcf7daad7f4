//! Maps tool descriptors from the tool server into the model's tool-calling
//! format. Pure functions, no state.

use serde_json::{json, Map, Value};

use crate::llm::ToolDefinition;
use crate::mcp::{ParamField, ParamSchema, SchemaType, ToolDescriptor};

/// Translate one tool descriptor.
pub fn translate_tool(tool: &ToolDescriptor) -> ToolDefinition {
    let description = tool
        .description
        .clone()
        .unwrap_or_else(|| format!("Execute {}", tool.name));

    ToolDefinition {
        name: tool.name.clone(),
        description,
        input_schema: object_schema(&tool.parameters),
    }
}

/// Translate a whole catalog, preserving order.
pub fn translate_catalog(tools: &[ToolDescriptor]) -> Vec<ToolDefinition> {
    tools.iter().map(translate_tool).collect()
}

/// Translate a single value schema.
pub fn translate_schema(schema: &ParamSchema) -> Value {
    let mut out = Map::new();

    if let Some(values) = &schema.enum_values {
        // Enumerations are always presented to the model as strings.
        out.insert("type".to_string(), json!("string"));
        out.insert(
            "enum".to_string(),
            Value::Array(values.iter().map(|v| Value::String(enum_label(v))).collect()),
        );
    } else {
        match &schema.kind {
            SchemaType::String => {
                out.insert("type".to_string(), json!("string"));
            }
            SchemaType::Integer => {
                out.insert("type".to_string(), json!("integer"));
            }
            SchemaType::Number => {
                out.insert("type".to_string(), json!("number"));
            }
            SchemaType::Boolean => {
                out.insert("type".to_string(), json!("boolean"));
            }
            SchemaType::Array(items) => {
                out.insert("type".to_string(), json!("array"));
                out.insert("items".to_string(), translate_schema(items));
            }
            SchemaType::Object(fields) => {
                if let Value::Object(object) = object_schema(fields) {
                    out.extend(object);
                }
            }
            SchemaType::OneOf(variants) => {
                out.insert(
                    "oneOf".to_string(),
                    Value::Array(variants.iter().map(translate_schema).collect()),
                );
            }
            SchemaType::Any => {}
        }
    }

    if let Some(description) = &schema.description {
        out.insert("description".to_string(), json!(description));
    }

    Value::Object(out)
}

fn object_schema(fields: &[ParamField]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|field| (field.name.clone(), translate_schema(&field.schema)))
        .collect();
    let required: Vec<Value> = fields
        .iter()
        .filter(|field| field.required)
        .map(|field| json!(field.name))
        .collect();

    let mut out = Map::new();
    out.insert("type".to_string(), json!("object"));
    out.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        out.insert("required".to_string(), Value::Array(required));
    }
    Value::Object(out)
}

fn enum_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
