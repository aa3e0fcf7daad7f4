//! System instruction for the tool-calling conversation.
//!
//! The instruction embeds the tool catalog currently offered to the model
//! together with fixed operating guidance.

use crate::llm::ToolDefinition;

/// Fixed operating guidance appended to every system instruction.
pub const OPERATING_GUIDANCE: &str = r#"Guidelines:
- Call authenticate before any operation that needs a logged-in store session.
- Explore the schema (explore_schema, search_schema, describe_type) before writing a freeform GraphQL query.
- Use only the tools listed above and pass parameters exactly as their schemas describe.
- When a tool returns an error, read it and decide whether another call can fix it.
- Keep the final answer concise and grounded in the tool results."#;

const PREAMBLE: &str = "You are an assistant that answers questions about a store backend by calling the tools it exposes.";

/// Build the system instruction for a catalog.
pub fn system_instruction(tools: &[ToolDefinition]) -> String {
    let mut out = String::from(PREAMBLE);
    out.push_str("\n\nAvailable tools:\n");

    if tools.is_empty() {
        out.push_str("- (none)\n");
    }
    for tool in tools {
        out.push_str("- ");
        out.push_str(&tool.name);
        out.push_str(": ");
        out.push_str(&tool.description);
        out.push('\n');
    }

    out.push('\n');
    out.push_str(OPERATING_GUIDANCE);
    out
}
