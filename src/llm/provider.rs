use async_trait::async_trait;

use super::types::{Message, ProviderReply, ProviderRequest, ToolResult};
use crate::error::ProviderResult;

/// A language model that can be driven through tool-calling turns.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider/model label used in logs and reports.
    fn name(&self) -> &str;

    /// Send the conversation so far and return the model's reply.
    async fn submit(&self, request: &ProviderRequest) -> ProviderResult<ProviderReply>;

    /// Replay `previous` and the tool results into the conversation, then submit.
    async fn continue_with_results(
        &self,
        request: &mut ProviderRequest,
        previous: &ProviderReply,
        results: &[ToolResult],
    ) -> ProviderResult<ProviderReply> {
        request.conversation.push(previous.to_message());
        request.conversation.push(Message::tool_results(results));
        self.submit(request).await
    }
}
