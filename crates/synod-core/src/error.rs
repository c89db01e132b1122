//! Error types for synod-core
//!
//! This module provides error types and user-friendly error formatting.
//! Only three conditions can abort an orchestration run: an unknown role in
//! the decomposition, a permanent completion-provider failure, and the case
//! where every dispatched agent failed. Everything else degrades.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Decomposition referenced a role that is not in the catalog
    #[error("role '{role}' is not in the agent catalog")]
    RoleNotFound {
        /// The unresolved role id
        role: String,
    },

    /// Every dispatched sub-task failed
    #[error("all {attempted} dispatched agents failed")]
    AllAgentsFailed {
        /// Number of sub-tasks attempted
        attempted: usize,
    },

    /// Completion provider error
    #[error("llm error: {0}")]
    Llm(#[from] synod_llm::Error),

    /// Persistence error
    #[error("store error: {0}")]
    Store(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Process exit code the hosting CLI maps this error to.
    ///
    /// Any returned `SynthesizedResult` (degraded included) exits 0; these
    /// codes cover the fatal paths only.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::RoleNotFound { .. } => 2,
            Error::AllAgentsFailed { .. } => 3,
            _ => 1,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Error::RoleNotFound { role } => {
                format!("The task decomposition named an unknown expert role: '{role}'.")
            }
            Error::AllAgentsFailed { attempted } => format!(
                "None of the {attempted} dispatched experts produced a response."
            ),
            Error::Llm(e) => format!("Completion service error: {e}"),
            Error::Store(msg) => format!("Persistence error: {msg}"),
            Error::Internal(msg) => format!("Internal error: {msg}"),
        }
    }

    /// Get a suggestion for how to fix the error
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::RoleNotFound { .. } => Some(
                "Run `synod roles` to list the available expert roles.".to_string(),
            ),
            Error::AllAgentsFailed { .. } => Some(
                "Check the trace output for per-role failure reasons, then retry.".to_string(),
            ),
            Error::Llm(synod_llm::Error::NotConfigured(_) | synod_llm::Error::Auth(_)) => Some(
                "Set the NVIDIA_API_KEY environment variable (or your .env file).".to_string(),
            ),
            Error::Llm(e) if e.is_transient() => {
                Some("The failure looks transient. Try again in a moment.".to_string())
            }
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
#[must_use]
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();

    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let not_found = Error::RoleNotFound {
            role: "plumber".into(),
        };
        assert_eq!(not_found.exit_code(), 2);

        let all_failed = Error::AllAgentsFailed { attempted: 3 };
        assert_eq!(all_failed.exit_code(), 3);

        let auth = Error::Llm(synod_llm::Error::Auth("bad key".into()));
        assert_eq!(auth.exit_code(), 1);
    }

    #[test]
    fn test_role_not_found_message() {
        let error = Error::RoleNotFound {
            role: "quantum-plumber".into(),
        };
        let msg = error.user_message();
        assert!(msg.contains("quantum-plumber"));
        assert!(error.suggestion().unwrap().contains("synod roles"));
    }

    #[test]
    fn test_auth_error_suggestion() {
        let error = Error::Llm(synod_llm::Error::Auth("rejected".into()));
        assert!(error.suggestion().unwrap().contains("NVIDIA_API_KEY"));
    }

    #[test]
    fn test_format_error_for_cli() {
        let error = Error::AllAgentsFailed { attempted: 2 };
        let output = format_error_for_cli(&error);
        assert!(output.contains("2 dispatched experts"));
        assert!(output.contains("trace"));
    }
}
