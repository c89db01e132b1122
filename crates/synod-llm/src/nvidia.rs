//! NVIDIA NIM provider
//!
//! This module implements the NVIDIA NIM provider using reqwest. NIM exposes
//! an OpenAI-compatible chat completions API, so a custom `base_url` also
//! works against other OpenAI-compatible gateways.

use crate::completion::{CompletionRequest, CompletionResponse, TokenUsage};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::provider::LlmProvider;
use crate::util::{mask_api_key, sanitize_api_error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Available NIM catalog models
pub const MODELS: &[&str] = &[
    "llama-3.3-70b-instruct",
    "mixtral-8x7b-instruct",
    "code-llama-70b-instruct",
    "llama-3-8b-instruct",
    "dbrx-instruct",
];

/// Default model: DBRX Instruct, the general-purpose catalog default
pub const DEFAULT_MODEL: &str = "dbrx-instruct";

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// NVIDIA NIM provider configuration
#[derive(Clone)]
pub struct NvidiaConfig {
    /// API key
    pub api_key: String,
    /// Base URL
    pub base_url: String,
    /// Default model
    pub default_model: String,
    /// Default max tokens
    pub default_max_tokens: u32,
    /// Request timeout
    pub timeout: Duration,
}

// Custom Debug implementation to mask the API key
impl fmt::Debug for NvidiaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NvidiaConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NvidiaConfig {
    /// Create a new configuration with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            default_max_tokens: 4096,
            timeout: Duration::from_secs(60),
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("NVIDIA_API_KEY")
            .map_err(|_| Error::NotConfigured("NVIDIA_API_KEY not set".to_string()))?;

        let base_url =
            std::env::var("NVIDIA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let default_model =
            std::env::var("NVIDIA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            base_url,
            default_model,
            default_max_tokens: 4096,
            timeout: Duration::from_secs(60),
        })
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the default max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// NVIDIA NIM provider
pub struct NvidiaProvider {
    client: Client,
    config: NvidiaConfig,
}

impl NvidiaProvider {
    /// Create a new NVIDIA provider
    pub fn new(config: NvidiaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let config = NvidiaConfig::from_env()?;
        Self::new(config)
    }

    /// Convert our messages to the wire format
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: msg.role.as_str(),
                content: msg.content.clone(),
            })
            .collect()
    }

    /// Map a non-success HTTP status and body to an error
    fn error_for_status(status: u16, body: &str) -> Error {
        let detail = serde_json::from_str::<ApiError>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status {
            401 | 403 => Error::Auth(sanitize_api_error(&detail)),
            429 => Error::RateLimit,
            500..=599 => Error::ServerError(sanitize_api_error(&detail)),
            _ => Error::Api(sanitize_api_error(&format!("HTTP {status}: {detail}"))),
        }
    }

    /// Send a chat completion request
    async fn send_request(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.config.base_url);

        debug!(model = %request.model, "Sending request to NVIDIA NIM: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.config.timeout.as_millis() as u64)
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::error_for_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl LlmProvider for NvidiaProvider {
    fn name(&self) -> &str {
        "nvidia"
    }

    fn available_models(&self) -> Vec<String> {
        MODELS.iter().map(|s| (*s).to_string()).collect()
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = if request.model.is_empty() {
            &self.config.default_model
        } else {
            &request.model
        };

        let chat_request = ChatRequest {
            model: model.to_string(),
            messages: Self::convert_messages(&request.messages),
            max_tokens: request.max_tokens.unwrap_or(self.config.default_max_tokens),
            temperature: request.temperature,
        };

        let response = self.send_request(chat_request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("response contained no choices".to_string()))?;

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
            finish_reason: choice.finish_reason,
            model: response.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = NvidiaConfig::new("test-key")
            .with_model("mixtral-8x7b-instruct")
            .with_max_tokens(2048)
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.default_model, "mixtral-8x7b-instruct");
        assert_eq!(config.default_max_tokens, 2048);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_available_models() {
        assert!(MODELS.contains(&"dbrx-instruct"));
        assert!(MODELS.contains(&"llama-3.3-70b-instruct"));
        assert!(MODELS.contains(&"code-llama-70b-instruct"));
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            Message::system("You are helpful"),
            Message::user("Hello"),
            Message::assistant("Hi there!"),
        ];

        let converted = NvidiaProvider::convert_messages(&messages);
        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
        assert_eq!(converted[2].role, "assistant");
    }

    #[test]
    fn test_error_for_status_auth() {
        let err = NvidiaProvider::error_for_status(401, r#"{"error":{"message":"bad key"}}"#);
        assert!(matches!(err, Error::Auth(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_error_for_status_rate_limit() {
        let err = NvidiaProvider::error_for_status(429, "");
        assert!(matches!(err, Error::RateLimit));
        assert!(err.is_transient());
    }

    #[test]
    fn test_error_for_status_server() {
        let err = NvidiaProvider::error_for_status(503, "upstream unavailable");
        assert!(matches!(err, Error::ServerError(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_error_for_status_other() {
        let err = NvidiaProvider::error_for_status(404, r#"{"error":{"message":"no such model"}}"#);
        assert!(matches!(err, Error::Api(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_config_debug_masks_key() {
        let config = NvidiaConfig::new("nvapi-1234567890abcdefghij");
        let debug_str = format!("{:?}", config);

        assert!(!debug_str.contains("1234567890"));
        assert!(debug_str.contains("nvap...ghij"));
    }
}
