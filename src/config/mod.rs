use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub session: SessionConfig,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub evaluation: EvaluationConfig,
}

/// Tool server connection configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub transport: TransportKind,
    /// Network address (required for [`TransportKind::Network`]).
    pub address: Option<String>,
    /// Launch command (required for [`TransportKind::LocalProcess`]).
    pub launch_command: Option<String>,
    pub launch_args: Vec<String>,
    pub timeout_ms: u64,
    pub tool_cache_max_age_secs: u64,
    pub credentials: Option<Credentials>,
}

/// Supported tool server transports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Network,
    LocalProcess,
}

/// Store credentials used by authentication calls
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub store_id: Option<i64>,
}

/// Language-model provider configuration
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
}

/// Conversation loop configuration
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    /// Maximum number of tool-call waves followed per test case.
    pub max_tool_rounds: u32,
}

impl TransportKind {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Network => "network",
            TransportKind::LocalProcess => "local-process",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "network" | "http" => Ok(TransportKind::Network),
            "local-process" | "local" | "stdio" => Ok(TransportKind::LocalProcess),
            other => Err(format!("Unsupported transport kind: {}", other)),
        }
    }
}

// Keeps the password out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("store_id", &self.store_id)
            .finish()
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl SessionConfig {
    /// Network session pointed at `address`.
    pub fn network(address: impl Into<String>) -> Self {
        Self {
            transport: TransportKind::Network,
            address: Some(address.into()),
            ..Self::default()
        }
    }

    /// Local-process session launching `command`.
    pub fn local_process(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            transport: TransportKind::LocalProcess,
            launch_command: Some(command.into()),
            launch_args: args,
            ..Self::default()
        }
    }

    /// Attach credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Human-readable transport target for error context.
    pub fn target(&self) -> String {
        match self.transport {
            TransportKind::Network => self.address.clone().unwrap_or_default(),
            TransportKind::LocalProcess => {
                let mut target = self.launch_command.clone().unwrap_or_default();
                for arg in &self.launch_args {
                    target.push(' ');
                    target.push_str(arg);
                }
                target
            }
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Network,
            address: None,
            launch_command: None,
            launch_args: Vec::new(),
            timeout_ms: 30000,
            tool_cache_max_age_secs: 300,
            credentials: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let transport = env::var("TOOL_SERVER_TRANSPORT")
            .unwrap_or_else(|_| "network".to_string())
            .parse::<TransportKind>()
            .map_err(|message| AppError::Config { message })?;

        let credentials = match env::var("STORE_USERNAME") {
            Ok(username) if !username.is_empty() => Some(Credentials {
                username,
                password: env::var("STORE_PASSWORD").unwrap_or_default(),
                store_id: env::var("STORE_ID").ok().and_then(|s| s.parse().ok()),
            }),
            _ => None,
        };

        let session = SessionConfig {
            transport,
            address: env::var("TOOL_SERVER_URL").ok().filter(|s| !s.is_empty()),
            launch_command: env::var("TOOL_SERVER_COMMAND")
                .ok()
                .filter(|s| !s.is_empty()),
            launch_args: env::var("TOOL_SERVER_ARGS")
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            timeout_ms: parse_env("TOOL_SERVER_TIMEOUT_MS", 30000),
            tool_cache_max_age_secs: parse_env("TOOL_CACHE_MAX_AGE_SECS", 300),
            credentials,
        };

        let provider = ProviderConfig {
            api_key: env::var("ANTHROPIC_API_KEY").map_err(|_| AppError::Config {
                message: "ANTHROPIC_API_KEY is required".to_string(),
            })?,
            base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            max_tokens: parse_env("ANTHROPIC_MAX_TOKENS", 4096),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: parse_env("REQUEST_TIMEOUT_MS", 60000),
        };

        let evaluation = EvaluationConfig {
            max_tool_rounds: parse_env("MAX_TOOL_ROUNDS", 5),
        };

        Ok(Config {
            session,
            provider,
            logging,
            request,
            evaluation,
        })
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_ms: 60000 }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { max_tool_rounds: 5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kind_parsing() {
        assert_eq!("network".parse::<TransportKind>(), Ok(TransportKind::Network));
        assert_eq!(
            "Local-Process".parse::<TransportKind>(),
            Ok(TransportKind::LocalProcess)
        );
        assert_eq!("stdio".parse::<TransportKind>(), Ok(TransportKind::LocalProcess));
        assert!("carrier-pigeon".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_transport_kind_display_round_trips() {
        for kind in [TransportKind::Network, TransportKind::LocalProcess] {
            assert_eq!(kind.to_string().parse::<TransportKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_session_config_target() {
        let config = SessionConfig::network("http://localhost:4000/mcp");
        assert_eq!(config.target(), "http://localhost:4000/mcp");

        let config = SessionConfig::local_process(
            "node",
            vec!["server.js".to_string(), "--stdio".to_string()],
        );
        assert_eq!(config.target(), "node server.js --stdio");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
            store_id: Some(1),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_defaults() {
        let session = SessionConfig::default();
        assert_eq!(session.timeout_ms, 30000);
        assert_eq!(session.tool_cache_max_age_secs, 300);
        assert!(session.credentials.is_none());
        assert_eq!(RequestConfig::default().timeout_ms, 60000);
        assert_eq!(EvaluationConfig::default().max_tool_rounds, 5);
    }
}
