use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::provider::LlmProvider;
use super::types::{MessagesRequest, MessagesResponse, ProviderReply, ProviderRequest};
use crate::config::{ProviderConfig, RequestConfig};
use crate::error::{ProviderError, ProviderResult};

/// Anthropic Messages API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    request_config: RequestConfig,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AnthropicClient {
    /// Create a new client
    pub fn new(config: &ProviderConfig, request_config: RequestConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(ProviderError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            request_config,
        })
    }

    /// Send one Messages API request. Failures are returned as-is; nothing is retried.
    pub async fn create_message(&self, request: &MessagesRequest) -> ProviderResult<MessagesResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        let start = Instant::now();

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Calling Messages API"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    ProviderError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                latency_ms = start.elapsed().as_millis(),
                "Messages API call failed"
            );
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let parsed: MessagesResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        info!(
            model = %request.model,
            latency_ms = start.elapsed().as_millis(),
            stop_reason = ?parsed.stop_reason,
            "Messages API call succeeded"
        );

        Ok(parsed)
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn submit(&self, request: &ProviderRequest) -> ProviderResult<ProviderReply> {
        let body = MessagesRequest::new(&self.model, self.max_tokens, request);
        let response = self.create_message(&body).await?;
        Ok(response.into_reply())
    }
}
