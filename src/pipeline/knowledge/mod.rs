//! Semantic retrieval over reference medical text.

pub mod http;
pub mod memory;
pub mod retriever;
mod seed;

use async_trait::async_trait;

use super::types::KnowledgeSnippet;
use super::RetrievalFailure;

pub use http::HttpKnowledgeIndex;
pub use memory::InMemoryKnowledgeIndex;
pub use retriever::KnowledgeRetriever;

/// Nearest-neighbour lookup over a pre-built text index.
#[async_trait]
pub trait KnowledgeIndex: Send + Sync {
    /// Up to `top_k` passages most similar to `query`, best first.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeSnippet>, RetrievalFailure>;

    async fn is_available(&self) -> bool;

    /// Short name for logs and health reports.
    fn name(&self) -> &'static str;
}

/// Lower-cased alphanumeric word tokens.
pub(crate) fn word_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}
