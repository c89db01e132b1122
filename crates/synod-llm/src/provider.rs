//! Provider trait and model tier selection

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trait for LLM completion providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get available models
    fn available_models(&self) -> Vec<String>;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Complete a conversation
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

/// Model tier for cost/latency selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Small, fast models for simple sub-tasks
    Fast,
    /// Balanced default
    Standard,
    /// Largest models for complex reasoning
    Premium,
}

impl ModelTier {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }

    /// Default catalog model for this tier
    #[must_use]
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Fast => "llama-3-8b-instruct",
            Self::Standard => "dbrx-instruct",
            Self::Premium => "llama-3.3-70b-instruct",
        }
    }
}

impl Default for ModelTier {
    fn default() -> Self {
        Self::Standard
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            other => Err(format!(
                "unknown model tier '{other}' (expected fast, standard, or premium)"
            )),
        }
    }
}
