//! Task analyzer - LLM-driven decomposition with a deterministic fallback
//!
//! The analyzer asks the completion service to split a task into role-scoped
//! sub-tasks and requires the reply to parse as JSON. A reply that does not
//! parse never surfaces as an error: the fallback decomposition (one
//! generalist sub-task at priority 1) is a documented policy with its own
//! code path. Only a permanent provider failure propagates.

use crate::error::{Error, Result};
use crate::roles::AgentRegistry;
use crate::types::{Decomposition, Task};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use synod_llm::{CompletionRequest, LlmProvider, Message};
use tracing::{debug, warn};

/// Low temperature: decomposition wants structure, not creativity
const DECOMPOSITION_TEMPERATURE: f32 = 0.2;

/// Max tokens for the decomposition reply
const DECOMPOSITION_MAX_TOKENS: u32 = 1024;

static JSON_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```")
        .expect("fence regex is a compile-time constant")
});

/// Decomposes a raw task into an ordered set of role-scoped sub-tasks
pub struct TaskAnalyzer {
    provider: Arc<dyn LlmProvider>,
    registry: AgentRegistry,
}

impl TaskAnalyzer {
    /// Create a new analyzer
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, registry: AgentRegistry) -> Self {
        Self { provider, registry }
    }

    /// Decompose a task into sub-tasks.
    ///
    /// Returns the fallback decomposition on parse failures and transient
    /// provider failures; fails only on permanent provider errors.
    pub async fn analyze(
        &self,
        task: &Task,
        working_context: Option<&str>,
        model: &str,
    ) -> Result<Decomposition> {
        let request = CompletionRequest::new(model)
            .with_message(Message::system(self.system_prompt()))
            .with_message(Message::user(Self::user_prompt(task, working_context)))
            .with_max_tokens(DECOMPOSITION_MAX_TOKENS)
            .with_temperature(DECOMPOSITION_TEMPERATURE);

        let reply = match self.provider.complete(request).await {
            Ok(response) => response.content,
            Err(e) if e.is_transient() => {
                warn!(error = %e, "decomposition call failed, falling back to generalist");
                return Ok(self.fallback(task));
            }
            Err(e) => return Err(Error::Llm(e)),
        };

        match parse_decomposition(&reply) {
            Some(decomposition) => {
                debug!(
                    subtasks = decomposition.subtasks.len(),
                    strategy = ?decomposition.synthesis_strategy,
                    "decomposition parsed"
                );
                Ok(decomposition)
            }
            None => {
                warn!("decomposition reply did not parse, falling back to generalist");
                Ok(self.fallback(task))
            }
        }
    }

    fn fallback(&self, task: &Task) -> Decomposition {
        Decomposition::fallback(self.registry.default_role(), &task.description)
    }

    fn system_prompt(&self) -> String {
        let catalog: String = self
            .registry
            .roles()
            .iter()
            .map(|role| {
                let profile = self.registry.profile(*role);
                format!("- {}: {}\n", profile.id, profile.domain)
            })
            .collect();

        format!(
            "You are the triage stage of a multi-expert pipeline. Split the task into \
             sub-tasks, assigning each to exactly one of these roles:\n{catalog}\n\
             Reply with a single JSON object and nothing else:\n\
             {{\"subtasks\": [{{\"role\": \"<role-id>\", \"instructions\": \"<what this \
             expert must do>\", \"priority\": <integer, lower runs earlier>}}], \
             \"synthesis_strategy\": \"consolidated\" or \"single_agent_response\"}}\n\
             Use as few sub-tasks as the task genuinely needs."
        )
    }

    fn user_prompt(task: &Task, working_context: Option<&str>) -> String {
        let mut prompt = format!("Task: {}\n\n{}", task.title, task.description);

        if !task.goals.is_empty() {
            prompt.push_str("\n\nGoals:\n");
            for goal in &task.goals {
                prompt.push_str(&format!("- {goal}\n"));
            }
        }
        if !task.constraints.is_empty() {
            prompt.push_str("\n\nConstraints:\n");
            for constraint in &task.constraints {
                prompt.push_str(&format!("- {constraint}\n"));
            }
        }
        if let Some(context) = working_context {
            prompt.push_str("\n\nWorking context:\n");
            prompt.push_str(context);
        }

        prompt
    }
}

/// Extract the decomposition JSON object from a model reply.
///
/// Accepts a fenced ```json block or a bare object embedded in prose.
fn extract_json(text: &str) -> Option<&str> {
    if let Some(captures) = JSON_FENCE_RE.captures(text) {
        return captures.get(1).map(|m| m.as_str());
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model reply into a decomposition. `None` means fallback.
fn parse_decomposition(text: &str) -> Option<Decomposition> {
    let json = extract_json(text)?;
    let decomposition: Decomposition = serde_json::from_str(json).ok()?;
    if decomposition.subtasks.is_empty() {
        return None;
    }
    Some(decomposition)
}
