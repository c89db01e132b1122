//! Orchestrator configuration and per-call options

use std::path::{Path, PathBuf};
use std::time::Duration;
use synod_llm::ModelTier;

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Explicit model for every completion call (overrides tier selection)
    pub model: Option<String>,
    /// Default model tier when no explicit model is set
    pub model_tier: ModelTier,
    /// Max tokens per expert response
    pub agent_max_tokens: u32,
    /// Sampling temperature for expert calls
    pub temperature: f32,
    /// Per-completion-call timeout; exceeding it counts as a transient failure
    pub completion_timeout: Duration,
    /// Backoff before the single synthesis retry
    pub retry_backoff: Duration,
    /// Data directory for knowledge records and task manifests
    pub data_dir: PathBuf,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".synod");

        Self {
            model: None,
            model_tier: ModelTier::Standard,
            agent_max_tokens: 2048,
            temperature: 0.7,
            completion_timeout: Duration::from_secs(120),
            retry_backoff: Duration::from_millis(500),
            data_dir,
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the default model tier
    #[must_use]
    pub fn with_model_tier(mut self, tier: ModelTier) -> Self {
        self.model_tier = tier;
        self
    }

    /// Set the per-expert max tokens
    #[must_use]
    pub fn with_agent_max_tokens(mut self, max_tokens: u32) -> Self {
        self.agent_max_tokens = max_tokens;
        self
    }

    /// Set the expert sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the per-call completion timeout
    #[must_use]
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// Set the synthesis retry backoff
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the data directory
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }
}

/// Per-call options supplied by the hosting boundary
#[derive(Debug, Clone, Default)]
pub struct OrchestrateOptions {
    /// Log each expert's full response as it arrives
    pub show_thinking: bool,
    /// File whose contents are added to the working context
    pub target_file: Option<PathBuf>,
    /// Tier override for this run
    pub model_tier: Option<ModelTier>,
    /// Free-form working context passed through to every prompt
    pub working_context: Option<String>,
}

impl OrchestrateOptions {
    /// Create default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log each expert's full response
    #[must_use]
    pub fn with_show_thinking(mut self, show: bool) -> Self {
        self.show_thinking = show;
        self
    }

    /// Add a file to the working context
    #[must_use]
    pub fn with_target_file(mut self, path: impl AsRef<Path>) -> Self {
        self.target_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Override the model tier for this run
    #[must_use]
    pub fn with_model_tier(mut self, tier: ModelTier) -> Self {
        self.model_tier = Some(tier);
        self
    }

    /// Set free-form working context
    #[must_use]
    pub fn with_working_context(mut self, context: impl Into<String>) -> Self {
        self.working_context = Some(context.into());
        self
    }
}
