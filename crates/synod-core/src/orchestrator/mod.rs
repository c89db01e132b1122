//! Orchestrator - Main execution loop
//!
//! This module provides the dispatch loop that ties together the analyzer,
//! registry, freshness tracker, and synthesizer.
//!
//! # Module Structure
//!
//! - `config`: Configuration types (OrchestratorConfig, OrchestrateOptions)
//! - `core`: Orchestrator struct and builder methods
//! - `process`: The sequential dispatch loop

mod config;
mod core;
mod process;


// Re-export public types
pub use config::{OrchestrateOptions, OrchestratorConfig};
pub use core::Orchestrator;
