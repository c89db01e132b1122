//! Core data types for orchestration
//!
//! A `Task` and everything derived from it (`SubTask`, `AgentResponse`,
//! `SynthesizedResult`) belong to exactly one orchestration run. Role
//! profiles and knowledge records are the long-lived state and live in
//! [`crate::roles`] and [`crate::freshness`].

use crate::roles::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Maximum characters taken from the first line for a derived task title
const TITLE_MAX_CHARS: usize = 80;

/// A single orchestration request. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Task ID
    pub id: Uuid,
    /// Short title
    pub title: String,
    /// Full task description
    pub description: String,
    /// Explicit goals
    #[serde(default)]
    pub goals: Vec<String>,
    /// Constraints the answer must respect
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl Task {
    /// Create a task from raw text. The title is derived from the first line.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        let description = text.into();
        let first_line = description.lines().next().unwrap_or_default().trim();
        let title: String = first_line.chars().take(TITLE_MAX_CHARS).collect();

        Self {
            id: Uuid::new_v4(),
            title,
            description,
            goals: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Set explicit goals
    #[must_use]
    pub fn with_goals(mut self, goals: Vec<String>) -> Self {
        self.goals = goals;
        self
    }

    /// Set constraints
    #[must_use]
    pub fn with_constraints(mut self, constraints: Vec<String>) -> Self {
        self.constraints = constraints;
        self
    }
}

/// One role-scoped unit of work produced by decomposition.
///
/// `role_id` is the wire form; the orchestrator resolves it against the
/// registry before any dispatch and an unresolved id aborts the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTask {
    /// Target role id (e.g. "code-analyzer")
    #[serde(alias = "role")]
    pub role_id: String,
    /// Instructions for the role
    pub instructions: String,
    /// Execution priority (lower = earlier; ties keep decomposition order)
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_priority() -> u32 {
    1
}

/// How the synthesizer combines agent responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisStrategy {
    /// Reconcile all responses into one answer
    #[default]
    Consolidated,
    /// A single agent's response stands alone
    SingleAgentResponse,
}

/// Ordered decomposition of one task into role-scoped sub-tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decomposition {
    /// Sub-tasks in decomposition order
    pub subtasks: Vec<SubTask>,
    /// Synthesis strategy hint
    #[serde(default, deserialize_with = "lenient_strategy")]
    pub synthesis_strategy: SynthesisStrategy,
}

/// Accept any string for the strategy; unknown values mean "consolidated".
/// The model writing the decomposition occasionally invents variants.
fn lenient_strategy<'de, D>(deserializer: D) -> Result<SynthesisStrategy, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(match raw.as_str() {
        "single_agent_response" => SynthesisStrategy::SingleAgentResponse,
        _ => SynthesisStrategy::Consolidated,
    })
}

impl Decomposition {
    /// The deterministic fallback used when the decomposition reply cannot be
    /// parsed: exactly one sub-task for the default role at priority 1.
    #[must_use]
    pub fn fallback(default_role: Role, task_text: impl Into<String>) -> Self {
        Self {
            subtasks: vec![SubTask {
                role_id: default_role.as_str().to_string(),
                instructions: task_text.into(),
                priority: 1,
            }],
            synthesis_strategy: SynthesisStrategy::SingleAgentResponse,
        }
    }
}

/// Outcome of one dispatched sub-task attempt. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Role that handled the sub-task
    pub role: Role,
    /// Response content (empty on failure)
    pub content: String,
    /// Whether the completion call succeeded
    pub success: bool,
    /// Failure reason if the call did not succeed
    pub failure: Option<String>,
    /// When the attempt finished
    pub timestamp: DateTime<Utc>,
    /// Whether the prompt carried freshly retrieved knowledge updates
    pub used_augmentation: bool,
}

impl AgentResponse {
    /// Record a successful attempt
    #[must_use]
    pub fn succeeded(role: Role, content: impl Into<String>, used_augmentation: bool) -> Self {
        Self {
            role,
            content: content.into(),
            success: true,
            failure: None,
            timestamp: Utc::now(),
            used_augmentation,
        }
    }

    /// Record a failed attempt
    #[must_use]
    pub fn failed(role: Role, reason: impl Into<String>) -> Self {
        Self {
            role,
            content: String::new(),
            success: false,
            failure: Some(reason.into()),
            timestamp: Utc::now(),
            used_augmentation: false,
        }
    }
}

/// Terminal artifact of one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizedResult {
    /// The original task
    pub task: Task,
    /// Roles whose sub-tasks succeeded, in execution order
    pub agents_involved: Vec<Role>,
    /// The synthesized answer
    pub final_text: String,
    /// Whether synthesis fell back to plain concatenation
    pub degraded: bool,
    /// When the run completed
    pub created_at: DateTime<Utc>,
    /// Every dispatch attempt, including failures with their reasons
    pub trace: Vec<AgentResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_from_text_title() {
        let task = Task::from_text("Fix the login bug\nIt crashes on empty passwords.");
        assert_eq!(task.title, "Fix the login bug");
        assert!(task.description.contains("empty passwords"));
        assert!(task.goals.is_empty());
    }

    #[test]
    fn test_task_title_truncated() {
        let long_line = "x".repeat(200);
        let task = Task::from_text(long_line);
        assert_eq!(task.title.chars().count(), 80);
    }

    #[test]
    fn test_subtask_deserialization_defaults() {
        let st: SubTask =
            serde_json::from_str(r#"{"role": "architect", "instructions": "sketch it"}"#).unwrap();
        assert_eq!(st.role_id, "architect");
        assert_eq!(st.priority, 1);
    }

    #[test]
    fn test_decomposition_lenient_strategy() {
        let d: Decomposition = serde_json::from_str(
            r#"{"subtasks": [], "synthesis_strategy": "single_agent_response"}"#,
        )
        .unwrap();
        assert_eq!(d.synthesis_strategy, SynthesisStrategy::SingleAgentResponse);

        let d: Decomposition =
            serde_json::from_str(r#"{"subtasks": [], "synthesis_strategy": "blend_everything"}"#)
                .unwrap();
        assert_eq!(d.synthesis_strategy, SynthesisStrategy::Consolidated);

        let d: Decomposition = serde_json::from_str(r#"{"subtasks": []}"#).unwrap();
        assert_eq!(d.synthesis_strategy, SynthesisStrategy::Consolidated);
    }

    #[test]
    fn test_fallback_decomposition_shape() {
        let d = Decomposition::fallback(Role::Generalist, "do the thing");
        assert_eq!(d.subtasks.len(), 1);
        assert_eq!(d.subtasks[0].role_id, "generalist");
        assert_eq!(d.subtasks[0].priority, 1);
        assert_eq!(d.subtasks[0].instructions, "do the thing");
        assert_eq!(d.synthesis_strategy, SynthesisStrategy::SingleAgentResponse);
    }

    #[test]
    fn test_agent_response_constructors() {
        let ok = AgentResponse::succeeded(Role::CodeAnalyzer, "looks fine", true);
        assert!(ok.success);
        assert!(ok.failure.is_none());
        assert!(ok.used_augmentation);

        let bad = AgentResponse::failed(Role::Architect, "rate limit exceeded");
        assert!(!bad.success);
        assert_eq!(bad.failure.as_deref(), Some("rate limit exceeded"));
        assert!(bad.content.is_empty());
    }
}
