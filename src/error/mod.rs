use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("Fixture error: {message}")]
    Fixture { message: String },
}

/// Errors raised by the tool-server session client
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connect, handshake or transport-level failure.
    #[error("Transport error ({kind} {target}): {message}")]
    Transport {
        message: String,
        kind: String,
        target: String,
        #[source]
        source: anyhow::Error,
    },

    /// Operation attempted before the session reached `Ready`.
    #[error("Session not initialized: cannot {operation}")]
    NotReady { operation: String },

    /// Parameters rejected before any call was attempted.
    #[error("Invalid input for {tool}: {field} - {reason}")]
    InvalidInput {
        tool: String,
        field: String,
        reason: String,
    },

    /// The call was attempted and failed. Always paired with an invocation record.
    #[error("Tool {tool} failed: {message}")]
    ToolExecution { tool: String, message: String },
}

impl SessionError {
    /// True for parameter-validation failures.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SessionError::InvalidInput { .. })
    }

    /// True when the session was not ready for the operation.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, SessionError::NotReady { .. })
    }

    /// True for transport-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, SessionError::Transport { .. })
    }

    pub(crate) fn not_ready(operation: impl Into<String>) -> Self {
        SessionError::NotReady {
            operation: operation.into(),
        }
    }

    pub(crate) fn invalid_input(
        tool: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SessionError::InvalidInput {
            tool: tool.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Language-model API errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Conversation orchestration errors
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Orchestrator requires a ready session (current phase: {phase})")]
    NotReady { phase: String },

    #[error("Unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("{0}")]
    Provider(#[from] ProviderError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result type alias for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing key");

        let err = AppError::Fixture {
            message: "bad file".to_string(),
        };
        assert_eq!(err.to_string(), "Fixture error: bad file");
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::not_ready("invoke search_schema");
        assert_eq!(
            err.to_string(),
            "Session not initialized: cannot invoke search_schema"
        );

        let err = SessionError::invalid_input("search_schema", "keyword", "cannot be empty");
        assert_eq!(
            err.to_string(),
            "Invalid input for search_schema: keyword - cannot be empty"
        );

        let err = SessionError::ToolExecution {
            tool: "execute_graphql".to_string(),
            message: "syntax error".to_string(),
        };
        assert_eq!(err.to_string(), "Tool execute_graphql failed: syntax error");
    }

    #[test]
    fn test_transport_error_carries_context_and_source() {
        let err = SessionError::Transport {
            message: "handshake failed".to_string(),
            kind: "network".to_string(),
            target: "http://localhost:4000/mcp".to_string(),
            source: anyhow::anyhow!("connection refused"),
        };
        assert_eq!(
            err.to_string(),
            "Transport error (network http://localhost:4000/mcp): handshake failed"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_session_error_classification() {
        assert!(SessionError::invalid_input("a", "b", "c").is_invalid_input());
        assert!(!SessionError::invalid_input("a", "b", "c").is_not_ready());
        assert!(SessionError::not_ready("x").is_not_ready());
        assert!(!SessionError::not_ready("x").is_transport());
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::Api {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 401 - unauthorized");

        let err = ProviderError::InvalidResponse {
            message: "malformed JSON".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid response: malformed JSON");

        let err = ProviderError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "Request timeout after 5000ms");
    }

    #[test]
    fn test_orchestrator_error_wraps_layers() {
        let err: OrchestratorError = ProviderError::Timeout { timeout_ms: 10 }.into();
        assert!(matches!(err, OrchestratorError::Provider(_)));
        assert_eq!(err.to_string(), "Request timeout after 10ms");

        let err: OrchestratorError = SessionError::not_ready("list tools").into();
        assert!(matches!(err, OrchestratorError::Session(_)));

        let err = OrchestratorError::UnknownTool {
            tool_name: "teleport".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown tool: teleport");
    }

    #[test]
    fn test_layer_errors_convert_to_app_error() {
        let app_err: AppError = SessionError::not_ready("connect").into();
        assert!(matches!(app_err, AppError::Session(_)));

        let app_err: AppError = ProviderError::Timeout { timeout_ms: 1000 }.into();
        assert!(matches!(app_err, AppError::Provider(_)));

        let app_err: AppError = OrchestratorError::UnknownTool {
            tool_name: "x".to_string(),
        }
        .into();
        assert!(matches!(app_err, AppError::Orchestrator(_)));
    }
}
