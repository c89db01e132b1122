//! Synod Core - Multi-Expert Orchestration Engine
//!
//! Synod turns one high-level task into a set of role-scoped sub-tasks,
//! dispatches each to a specialized expert profile, and synthesizes the
//! responses into a single result:
//!
//! - [`analyzer::TaskAnalyzer`]: LLM-driven decomposition with a
//!   deterministic single-generalist fallback
//! - [`roles::AgentRegistry`]: the closed catalog of expert roles
//! - [`freshness::KnowledgeFreshnessTracker`]: best-effort augmentation of
//!   stale role knowledge via web search
//! - [`orchestrator::Orchestrator`]: the sequential dispatch loop
//! - [`synthesizer::ResponseSynthesizer`]: reconciliation of expert
//!   responses, with a concatenation fallback
//! - [`store::TaskMemoryStore`]: task manifest and current-task persistence

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analyzer;
pub mod error;
pub mod freshness;
pub mod orchestrator;
pub mod roles;
pub mod store;
pub mod synthesizer;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
pub use orchestrator::{OrchestrateOptions, Orchestrator, OrchestratorConfig};
pub use roles::{AgentRegistry, ExpertiseBoundary, Role, RoleProfile};
pub use types::{
    AgentResponse, Decomposition, SubTask, SynthesisStrategy, SynthesizedResult, Task,
};
