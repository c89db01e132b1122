//! Search provider trait and result types

use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single search result entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result title
    pub title: String,
    /// Destination URL
    pub url: String,
    /// Publication date, when the engine surfaced one
    pub date: Option<NaiveDate>,
    /// Result snippet
    pub snippet: String,
}

/// Trait for web search providers
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Run a search query and return result hits.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}
