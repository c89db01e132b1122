//! Error types for synod-search

use thiserror::Error;

/// Search error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Bot detection / CAPTCHA triggered
    #[error("search blocked: {0}")]
    Blocked(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
