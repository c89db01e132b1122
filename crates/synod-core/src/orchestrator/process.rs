//! Orchestration pipeline
//!
//! The control loop: decompose the task, order sub-tasks by priority,
//! validate every role up front, dispatch strictly sequentially, then
//! synthesize the surviving responses.
//!
//! Sequential dispatch is deliberate: it keeps the completion service inside
//! its rate limits and makes the synthesis input order deterministic.

use crate::error::{Error, Result};
use crate::freshness::KnowledgeEntry;
use crate::roles::Role;
use crate::store::TaskManifest;
use crate::types::{AgentResponse, SubTask, SynthesizedResult, Task};
use chrono::Utc;
use synod_llm::{CompletionRequest, Error as LlmError, Message};
use tracing::{debug, error, info, warn};

use super::config::OrchestrateOptions;
use super::core::Orchestrator;

impl Orchestrator {
    /// Run the full pipeline for one task.
    ///
    /// The task is passed in explicitly; the hosting boundary resolves any
    /// "current task" pointer and injects it. Fatal outcomes are an unknown
    /// role in the decomposition, a permanent completion failure, and the
    /// case where every dispatched sub-task failed.
    pub async fn orchestrate(
        &self,
        task: Task,
        options: &OrchestrateOptions,
    ) -> Result<SynthesizedResult> {
        let start = std::time::Instant::now();
        let model = self.effective_model(options);

        info!(task_id = %task.id, title = %task.title, model = %model, "Starting orchestration");

        let working_context = self.build_working_context(options);

        // Decompose. Parse failures are already absorbed into the
        // single-generalist fallback inside the analyzer.
        let decomposition = self
            .analyzer
            .analyze(&task, working_context.as_deref(), &model)
            .await?;
        let strategy = decomposition.synthesis_strategy;

        // Execution order: ascending priority, stable for ties. This order is
        // reused as the synthesis presentation order.
        let mut subtasks = decomposition.subtasks;
        subtasks.sort_by_key(|subtask| subtask.priority);

        // Role validity is a structural precondition: resolve every id before
        // spending a single completion call.
        let mut plan = Vec::with_capacity(subtasks.len());
        for subtask in subtasks {
            let role = self.registry.resolve(&subtask.role_id)?;
            plan.push((role, subtask));
        }

        info!(subtasks = plan.len(), "dispatching sub-tasks");

        let mut freshness_run = self.freshness.begin_run();
        let mut trace: Vec<AgentResponse> = Vec::with_capacity(plan.len());

        for (index, (role, subtask)) in plan.iter().enumerate() {
            let profile = self.registry.profile(*role);

            let recent = if profile.requires_freshness {
                freshness_run.updates_for(*role).await.to_vec()
            } else {
                Vec::new()
            };

            let request = CompletionRequest::new(&model)
                .with_message(Message::system(self.role_system_prompt(*role, &recent)))
                .with_message(Message::user(Self::subtask_prompt(
                    &task,
                    subtask,
                    working_context.as_deref(),
                )))
                .with_max_tokens(self.config.agent_max_tokens)
                .with_temperature(self.config.temperature);

            debug!(step = index + 1, role = %role, "dispatching sub-task");

            let outcome = match tokio::time::timeout(
                self.config.completion_timeout,
                self.provider.complete(request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(
                    self.config.completion_timeout.as_millis() as u64,
                )),
            };

            match outcome {
                Ok(response) => {
                    if options.show_thinking {
                        info!(role = %role, response = %response.content, "sub-task response");
                    }
                    trace.push(AgentResponse::succeeded(
                        *role,
                        response.content,
                        !recent.is_empty(),
                    ));
                }
                Err(e) if e.is_transient() => {
                    warn!(role = %role, error = %e, "sub-task failed, continuing with remaining sub-tasks");
                    trace.push(AgentResponse::failed(*role, e.to_string()));
                }
                Err(e) => {
                    error!(role = %role, error = %e, "permanent completion failure, aborting orchestration");
                    return Err(Error::Llm(e));
                }
            }
        }

        let successes: Vec<AgentResponse> = trace.iter().filter(|r| r.success).cloned().collect();
        if successes.is_empty() {
            return Err(Error::AllAgentsFailed {
                attempted: trace.len(),
            });
        }

        let (final_text, degraded) = self
            .synthesizer
            .synthesize(&successes, &task, strategy, &model)
            .await;

        let result = SynthesizedResult {
            agents_involved: successes.iter().map(|r| r.role).collect(),
            task,
            final_text,
            degraded,
            created_at: Utc::now(),
            trace,
        };

        if let Some(store) = &self.store {
            let manifest = self.manifest_for(&result, options);
            if let Err(e) = store.write_manifest(&result.task.id.to_string(), &manifest) {
                warn!(error = %e, "failed to persist task manifest");
            }
        }

        info!(
            task_id = %result.task.id,
            agents = result.agents_involved.len(),
            attempted = result.trace.len(),
            degraded = result.degraded,
            duration_ms = start.elapsed().as_millis() as u64,
            "Orchestration complete"
        );

        Ok(result)
    }

    /// Convenience wrapper that builds the `Task` from raw text
    pub async fn orchestrate_text(
        &self,
        text: &str,
        options: &OrchestrateOptions,
    ) -> Result<SynthesizedResult> {
        self.orchestrate(Task::from_text(text), options).await
    }

    /// Role-scoped system prompt: base prompt, advisory expertise boundary,
    /// and (for freshness-tracked roles) the augmentation section.
    fn role_system_prompt(&self, role: Role, recent: &[KnowledgeEntry]) -> String {
        let profile = self.registry.profile(role);
        let boundary = self.registry.boundary(role);

        let base = format!(
            "{}\n\nYour domain: {}.\nIn scope: {}.\nOut of scope: {}.\nStay within your \
             expertise; where the task falls outside it, say so instead of guessing.",
            profile.base_prompt, boundary.domain, boundary.scope, boundary.limitations
        );

        self.freshness.augmented_prompt(role, &base, recent)
    }

    fn subtask_prompt(task: &Task, subtask: &SubTask, working_context: Option<&str>) -> String {
        let mut prompt = format!(
            "{}\n\nOverall task: {}\n{}",
            subtask.instructions, task.title, task.description
        );

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

    fn build_working_context(&self, options: &OrchestrateOptions) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();

        if let Some(context) = &options.working_context {
            parts.push(context.clone());
        }

        if let Some(path) = &options.target_file {
            match std::fs::read_to_string(path) {
                Ok(contents) => parts.push(format!(
                    "## File: {}\n```\n{}\n```",
                    path.display(),
                    contents
                )),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not read target file, continuing without it");
                }
            }
        }

        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }

    fn manifest_for(&self, result: &SynthesizedResult, options: &OrchestrateOptions) -> TaskManifest {
        TaskManifest {
            title: result.task.title.clone(),
            description: result.task.description.clone(),
            goals: result.task.goals.clone(),
            constraints: result.task.constraints.clone(),
            model_tier: Some(options.model_tier.unwrap_or(self.config.model_tier)),
            agents_involved: result.agents_involved.clone(),
            degraded: result.degraded,
            updated_at: Some(result.created_at),
        }
    }
}
