//! Orchestrator core structure
//!
//! Contains the main `Orchestrator` struct and its builder methods.

use crate::analyzer::TaskAnalyzer;
use crate::freshness::KnowledgeFreshnessTracker;
use crate::roles::AgentRegistry;
use crate::store::TaskMemoryStore;
use crate::synthesizer::ResponseSynthesizer;
use std::sync::Arc;
use synod_llm::LlmProvider;
use synod_search::SearchProvider;

use super::config::{OrchestrateOptions, OrchestratorConfig};

/// Main orchestrator coordinating decomposition, dispatch, and synthesis
pub struct Orchestrator {
    pub(crate) provider: Arc<dyn LlmProvider>,
    pub(crate) registry: AgentRegistry,
    pub(crate) analyzer: TaskAnalyzer,
    pub(crate) freshness: KnowledgeFreshnessTracker,
    pub(crate) synthesizer: ResponseSynthesizer,
    pub(crate) store: Option<TaskMemoryStore>,
    pub(crate) config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create a new orchestrator
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: OrchestratorConfig) -> Self {
        let registry = AgentRegistry::new();
        let analyzer = TaskAnalyzer::new(provider.clone(), registry);
        let freshness = KnowledgeFreshnessTracker::new(registry, &config.data_dir);
        let synthesizer = ResponseSynthesizer::new(provider.clone(), registry)
            .with_retry_backoff(config.retry_backoff);

        Self {
            provider,
            registry,
            analyzer,
            freshness,
            synthesizer,
            store: None,
            config,
        }
    }

    /// Attach a search provider for freshness checks.
    ///
    /// Without one, freshness-tracked roles run on cached knowledge only.
    #[must_use]
    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.freshness =
            KnowledgeFreshnessTracker::new(self.registry, &self.config.data_dir).with_search(search);
        self
    }

    /// Attach a task memory store for manifest persistence
    #[must_use]
    pub fn with_store(mut self, store: TaskMemoryStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Get the role registry
    #[must_use]
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Get the LLM provider name
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The model used for this run: explicit config model, else the tier's
    /// default (per-run override first).
    pub(crate) fn effective_model(&self, options: &OrchestrateOptions) -> String {
        if let Some(model) = &self.config.model {
            return model.clone();
        }
        options
            .model_tier
            .unwrap_or(self.config.model_tier)
            .default_model()
            .to_string()
    }
}
