//! Error types for synod-llm
//!
//! The dispatch policy of the orchestrator hangs on the transient/permanent
//! split: transient failures are recorded and skipped, permanent failures
//! abort the whole run.

use thiserror::Error;

/// Completion service error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Authentication rejected by the API
    #[error("authentication error: {0}")]
    Auth(String),

    /// API error (4xx other than auth / rate limit)
    #[error("api error: {0}")]
    Api(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimit,

    /// Server-side failure (5xx)
    #[error("server error: {0}")]
    ServerError(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Whether this failure is transient.
    ///
    /// Transient failures (rate limits, server errors, network problems,
    /// timeouts, garbled response bodies) may succeed on a later call and are
    /// eligible for skip-and-continue or retry. Authentication and
    /// configuration problems are permanent: repeating the same call cannot
    /// succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimit
                | Self::ServerError(_)
                | Self::Network(_)
                | Self::Timeout(_)
                | Self::InvalidResponse(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::RateLimit.is_transient());
        assert!(Error::ServerError("502 bad gateway".into()).is_transient());
        assert!(Error::Network("connection reset".into()).is_transient());
        assert!(Error::Timeout(30_000).is_transient());
    }

    #[test]
    fn test_permanent_classification() {
        assert!(!Error::Auth("invalid key".into()).is_transient());
        assert!(!Error::NotConfigured("NVIDIA_API_KEY not set".into()).is_transient());
        assert!(!Error::Api("bad request".into()).is_transient());
    }
}
