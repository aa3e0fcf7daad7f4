use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One content block of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    /// Block types the harness does not interpret (e.g. thinking).
    #[serde(other)]
    Other,
}

/// Message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Create a user message carrying tool results
    pub fn tool_results(results: &[ToolResult]) -> Self {
        Self {
            role: Role::User,
            content: results
                .iter()
                .map(|r| ContentBlock::ToolResult {
                    tool_use_id: r.call_id.clone(),
                    content: r.content.clone(),
                    is_error: r.is_error,
                })
                .collect(),
        }
    }

    /// Concatenated text blocks.
    pub fn text(&self) -> String {
        collect_text(&self.content)
    }
}

/// Tool definition in the model's tool-calling format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A tool call the model asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestedToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Result of one tool call, sent back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.input += other.input;
        self.output += other.output;
    }
}

/// Everything sent to the provider on one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub system_instruction: String,
    pub conversation: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

impl ProviderRequest {
    pub fn new(system_instruction: impl Into<String>, tools: Vec<ToolDefinition>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            conversation: Vec::new(),
            tools,
        }
    }

    /// Append a user turn
    pub fn with_user_message(mut self, text: impl Into<String>) -> Self {
        self.conversation.push(Message::user(text));
        self
    }
}

/// What the provider answered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderReply {
    pub text: String,
    pub tool_calls: Vec<RequestedToolCall>,
    pub usage: TokenUsage,
    pub stop_reason: Option<String>,
}

impl ProviderReply {
    /// Build a reply from response content blocks.
    pub fn from_blocks(blocks: &[ContentBlock], usage: TokenUsage, stop_reason: Option<String>) -> Self {
        let tool_calls = blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(RequestedToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect();

        Self {
            text: collect_text(blocks),
            tool_calls,
            usage,
            stop_reason,
        }
    }

    /// The assistant turn as it must be replayed in the conversation.
    pub fn to_message(&self) -> Message {
        let mut content = Vec::with_capacity(self.tool_calls.len() + 1);
        if !self.text.is_empty() {
            content.push(ContentBlock::Text {
                text: self.text.clone(),
            });
        }
        content.extend(self.tool_calls.iter().map(|call| ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.input.clone(),
        }));
        Message {
            role: Role::Assistant,
            content,
        }
    }
}

fn collect_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Messages API wire types
// ============================================================================

/// Request body for `POST /v1/messages`
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// Response body of `POST /v1/messages`
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl MessagesRequest {
    pub fn new(model: impl Into<String>, max_tokens: u32, request: &ProviderRequest) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            system: Some(request.system_instruction.clone()).filter(|s| !s.is_empty()),
            messages: request.conversation.clone(),
            tools: request.tools.clone(),
        }
    }
}

impl MessagesResponse {
    pub fn into_reply(self) -> ProviderReply {
        let usage = self
            .usage
            .map(|u| TokenUsage {
                input: u.input_tokens,
                output: u.output_tokens,
            })
            .unwrap_or_default();
        ProviderReply::from_blocks(&self.content, usage, self.stop_reason)
    }
}
