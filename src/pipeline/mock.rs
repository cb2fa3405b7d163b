//! Mock providers for unit and scenario tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::graph::{GraphPath, GraphStore};
use super::knowledge::KnowledgeIndex;
use super::synthesis::{ChatMessage, CompletionProvider, SynthesisFailure};
use super::types::KnowledgeSnippet;
use super::RetrievalFailure;

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

// ═══════════════════════════════════════════════════════════
// Completion
// ═══════════════════════════════════════════════════════════

pub struct MockCompletion {
    result: Result<String, SynthesisFailure>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl MockCompletion {
    pub fn replying(response: &str) -> Self {
        Self::with_result(Ok(response.to_string()))
    }

    pub fn failing(error: SynthesisFailure) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<String, SynthesisFailure>) -> Self {
        Self {
            result,
            delay: None,
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SynthesisFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        pause(self.delay).await;
        self.result.clone()
    }

    async fn is_available(&self) -> bool {
        pause(self.delay).await;
        self.result.is_ok()
    }

    fn name(&self) -> &'static str {
        "mock-completion"
    }
}

// ═══════════════════════════════════════════════════════════
// Knowledge
// ═══════════════════════════════════════════════════════════

pub struct MockKnowledge {
    result: Result<Vec<KnowledgeSnippet>, RetrievalFailure>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockKnowledge {
    pub fn returning(snippets: Vec<KnowledgeSnippet>) -> Self {
        Self {
            result: Ok(snippets),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: RetrievalFailure) -> Self {
        Self {
            result: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeIndex for MockKnowledge {
    async fn search(
        &self,
        _query: &str,
        _top_k: usize,
    ) -> Result<Vec<KnowledgeSnippet>, RetrievalFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        pause(self.delay).await;
        self.result.clone()
    }

    async fn is_available(&self) -> bool {
        pause(self.delay).await;
        self.result.is_ok()
    }

    fn name(&self) -> &'static str {
        "mock-knowledge"
    }
}

// ═══════════════════════════════════════════════════════════
// Graph
// ═══════════════════════════════════════════════════════════

pub struct MockGraph {
    result: Result<Vec<GraphPath>, RetrievalFailure>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockGraph {
    pub fn returning(paths: Vec<GraphPath>) -> Self {
        Self {
            result: Ok(paths),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: RetrievalFailure) -> Self {
        Self {
            result: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphStore for MockGraph {
    async fn symptom_paths(&self, _tokens: &[String]) -> Result<Vec<GraphPath>, RetrievalFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        pause(self.delay).await;
        self.result.clone()
    }

    async fn is_available(&self) -> bool {
        pause(self.delay).await;
        self.result.is_ok()
    }

    fn name(&self) -> &'static str {
        "mock-graph"
    }
}
