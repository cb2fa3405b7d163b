use std::sync::Arc;
use std::time::Duration;

use super::{word_tokens, KnowledgeIndex};
use crate::config::RetrievalConfig;
use crate::pipeline::types::{clamp_unit, KnowledgeSnippet, SourceOutcome};

/// Best-effort retrieval: never fails, only reports why it returned nothing.
pub struct KnowledgeRetriever {
    index: Arc<dyn KnowledgeIndex>,
    top_k: usize,
    min_query_tokens: usize,
    timeout: Duration,
}

impl KnowledgeRetriever {
    pub fn new(index: Arc<dyn KnowledgeIndex>, config: &RetrievalConfig) -> Self {
        Self {
            index,
            top_k: config.top_k,
            min_query_tokens: config.min_query_tokens,
            timeout: config.timeout(),
        }
    }

    pub fn index(&self) -> &Arc<dyn KnowledgeIndex> {
        &self.index
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn retrieve(&self, query: &str) -> SourceOutcome<Vec<KnowledgeSnippet>> {
        if word_tokens(query).count() < self.min_query_tokens {
            return SourceOutcome::Skipped("query too short");
        }

        match tokio::time::timeout(self.timeout, self.index.search(query, self.top_k)).await {
            Ok(Ok(mut snippets)) => {
                snippets.truncate(self.top_k);
                for snippet in &mut snippets {
                    snippet.relevance_score = clamp_unit(snippet.relevance_score);
                }
                tracing::debug!(index = self.index.name(), count = snippets.len(), "Knowledge retrieved");
                SourceOutcome::Ready(snippets)
            }
            Ok(Err(e)) => {
                tracing::warn!(index = self.index.name(), error = %e, "Knowledge retrieval failed");
                SourceOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    index = self.index.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Knowledge retrieval timed out"
                );
                SourceOutcome::TimedOut(self.timeout)
            }
        }
    }
}
