//! Response synthesizer
//!
//! Combines the successful expert responses into one final answer. The model
//! is asked to reconcile conflicts; if that call fails twice, synthesis
//! degrades to plain concatenation under role-labeled headings. Once at least
//! one agent has succeeded, this stage never fails the orchestration.

use crate::roles::AgentRegistry;
use crate::types::{AgentResponse, SynthesisStrategy, Task};
use std::sync::Arc;
use std::time::Duration;
use synod_llm::{CompletionRequest, LlmProvider, Message};
use tracing::{debug, error, warn};

/// Max tokens for the synthesized answer
const SYNTHESIS_MAX_TOKENS: u32 = 2048;

const SYNTHESIS_SYSTEM_PROMPT: &str = "You are the synthesis stage of a multi-expert \
    pipeline. Several experts have each answered one slice of the same task. Reconcile \
    their responses into a single coherent answer: resolve conflicts explicitly, drop \
    repetition, keep every substantive finding, and end with concrete next steps.";

/// Merges multiple role responses into one final answer
pub struct ResponseSynthesizer {
    provider: Arc<dyn LlmProvider>,
    registry: AgentRegistry,
    retry_backoff: Duration,
}

impl ResponseSynthesizer {
    /// Create a new synthesizer
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, registry: AgentRegistry) -> Self {
        Self {
            provider,
            registry,
            retry_backoff: Duration::from_millis(500),
        }
    }

    /// Set the backoff before the single retry
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Synthesize the successful responses, in execution order.
    ///
    /// Returns the final text and whether the degraded concatenation fallback
    /// was used. The caller guarantees at least one response.
    pub async fn synthesize(
        &self,
        responses: &[AgentResponse],
        task: &Task,
        strategy: SynthesisStrategy,
        model: &str,
    ) -> (String, bool) {
        if strategy == SynthesisStrategy::SingleAgentResponse && responses.len() == 1 {
            debug!("single agent response, skipping synthesis call");
            return (responses[0].content.clone(), false);
        }

        let request = CompletionRequest::new(model)
            .with_message(Message::system(SYNTHESIS_SYSTEM_PROMPT))
            .with_message(Message::user(self.build_prompt(responses, task)))
            .with_max_tokens(SYNTHESIS_MAX_TOKENS);

        match self.provider.complete(request.clone()).await {
            Ok(response) => return (response.content, false),
            Err(e) => {
                warn!(error = %e, "synthesis call failed, retrying once");
            }
        }

        tokio::time::sleep(self.retry_backoff).await;

        match self.provider.complete(request).await {
            Ok(response) => (response.content, false),
            Err(e) => {
                error!(error = %e, "synthesis retry failed, degrading to concatenation");
                (self.concatenate(responses), true)
            }
        }
    }

    fn build_prompt(&self, responses: &[AgentResponse], task: &Task) -> String {
        let mut prompt = format!("Original task: {}\n\n{}\n", task.title, task.description);

        prompt.push_str("\nExpert responses, in the order they ran:\n");
        for response in responses {
            let profile = self.registry.profile(response.role);
            prompt.push_str(&format!(
                "\n## {}\n{}\n",
                profile.display_name, response.content
            ));
        }

        prompt
    }

    /// Degraded mode: each role's raw text under a labeled heading.
    fn concatenate(&self, responses: &[AgentResponse]) -> String {
        responses
            .iter()
            .map(|response| {
                let profile = self.registry.profile(response.role);
                format!("## {}\n\n{}", profile.display_name, response.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;
    use crate::testing::ScriptedProvider;

    fn responses() -> Vec<AgentResponse> {
        vec![
            AgentResponse::succeeded(Role::CodeAnalyzer, "alpha findings", false),
            AgentResponse::succeeded(Role::SecurityExpert, "beta findings", true),
        ]
    }

    fn synthesizer(provider: Arc<ScriptedProvider>) -> ResponseSynthesizer {
        ResponseSynthesizer::new(provider, AgentRegistry::new())
            .with_retry_backoff(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_synthesis_success() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("merged answer".to_string())]));
        let task = Task::from_text("audit the service");

        let (text, degraded) = synthesizer(provider.clone())
            .synthesize(&responses(), &task, SynthesisStrategy::Consolidated, "m")
            .await;

        assert_eq!(text, "merged answer");
        assert!(!degraded);
        assert_eq!(provider.calls(), 1);

        // The prompt labels each response with its role
        let user = &provider.requests()[0].messages[1].content;
        assert!(user.contains("## Code Analyzer"));
        assert!(user.contains("## Security Expert"));
        assert!(user.contains("alpha findings"));
    }

    #[tokio::test]
    async fn test_synthesis_recovers_on_retry() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(synod_llm::Error::RateLimit),
            Ok("second try".to_string()),
        ]));
        let task = Task::from_text("audit the service");

        let (text, degraded) = synthesizer(provider.clone())
            .synthesize(&responses(), &task, SynthesisStrategy::Consolidated, "m")
            .await;

        assert_eq!(text, "second try");
        assert!(!degraded);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_synthesis_degrades_after_two_failures() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(synod_llm::Error::RateLimit),
            Err(synod_llm::Error::ServerError("boom".to_string())),
        ]));
        let task = Task::from_text("audit the service");

        let (text, degraded) = synthesizer(provider.clone())
            .synthesize(&responses(), &task, SynthesisStrategy::Consolidated, "m")
            .await;

        assert!(degraded);
        // Role-labeled concatenation in execution order
        let analyzer_pos = text.find("## Code Analyzer").unwrap();
        let security_pos = text.find("## Security Expert").unwrap();
        assert!(analyzer_pos < security_pos);
        assert!(text.contains("alpha findings"));
        assert!(text.contains("beta findings"));
        assert!(text.contains("---"));
    }

    #[tokio::test]
    async fn test_single_agent_response_passthrough() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let task = Task::from_text("quick question");
        let single = vec![AgentResponse::succeeded(
            Role::Generalist,
            "direct answer",
            false,
        )];

        let (text, degraded) = synthesizer(provider.clone())
            .synthesize(&single, &task, SynthesisStrategy::SingleAgentResponse, "m")
            .await;

        assert_eq!(text, "direct answer");
        assert!(!degraded);
        assert_eq!(provider.calls(), 0);
    }
}
