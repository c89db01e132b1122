//! Synod LLM - Completion Provider Abstraction
//!
//! This crate provides the completion-service integration for Synod:
//! - Provider: the `LlmProvider` trait and model tier selection
//! - NVIDIA: NVIDIA NIM provider (OpenAI-compatible chat completions)
//! - Completion: request/response types
//! - Error: error taxonomy with transient/permanent classification

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod message;
pub mod nvidia;
pub mod provider;
pub mod util;

pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use nvidia::{NvidiaConfig, NvidiaProvider};
pub use provider::{LlmProvider, ModelTier};
