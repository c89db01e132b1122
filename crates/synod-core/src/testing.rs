//! Scripted fake collaborators for tests
//!
//! Both fakes replay a queued script in call order, which keeps the
//! sequence-sensitive orchestrator tests deterministic.

use std::collections::VecDeque;
use std::sync::Mutex;
use synod_llm::{
    CompletionRequest, CompletionResponse, Error as LlmError, LlmProvider, Result as LlmResult,
};
use synod_search::{Error as SearchError, SearchHit, SearchProvider};

/// Completion provider that replays a scripted sequence of replies.
pub(crate) struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub(crate) fn new(script: Vec<Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of completion calls made so far
    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests captured in call order
    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn available_models(&self) -> Vec<String> {
        vec!["scripted-model".to_string()]
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        self.requests.lock().unwrap().push(request);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(CompletionResponse {
                content,
                usage: None,
                finish_reason: Some("stop".to_string()),
                model: "scripted-model".to_string(),
            }),
            Some(Err(e)) => Err(e),
            None => Err(LlmError::Api("script exhausted".to_string())),
        }
    }
}

/// Search provider that replays a scripted sequence of result sets.
///
/// An exhausted script yields empty result lists, so tests only queue the
/// calls they care about.
pub(crate) struct ScriptedSearch {
    script: Mutex<VecDeque<Result<Vec<SearchHit>, SearchError>>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub(crate) fn new(script: Vec<Result<Vec<SearchHit>, SearchError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Number of search calls made so far
    pub(crate) fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl SearchProvider for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, query: &str) -> synod_search::Result<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.to_string());

        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(Vec::new()),
        }
    }
}
