use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use super::seed::REFERENCE_CORPUS;
use super::{word_tokens, KnowledgeIndex};
use crate::pipeline::types::{clamp_unit, KnowledgeSnippet};
use crate::pipeline::RetrievalFailure;

/// Width of the hashed bag-of-words vectors.
const EMBEDDING_DIM: usize = 512;

/// In-process index: hashed bag-of-words embeddings ranked by cosine
/// similarity.
pub struct InMemoryKnowledgeIndex {
    entries: Vec<StoredPassage>,
}

struct StoredPassage {
    source_id: String,
    text: String,
    embedding: Vec<f32>,
}

/// One passage of a JSON corpus file.
#[derive(Debug, Deserialize)]
pub struct CorpusEntry {
    pub source_id: String,
    pub text: String,
}

impl InMemoryKnowledgeIndex {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Index seeded with the built-in reference passages.
    pub fn with_reference_corpus() -> Self {
        let mut index = Self::new();
        for (source_id, text) in REFERENCE_CORPUS {
            index.add(source_id, text);
        }
        index
    }

    /// Load a corpus file shaped `[{"source_id": ..., "text": ...}]`.
    pub fn from_json_file(path: &Path) -> Result<Self, RetrievalFailure> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RetrievalFailure::Query(format!("Cannot read corpus {}: {e}", path.display()))
        })?;
        let entries: Vec<CorpusEntry> = serde_json::from_str(&raw)
            .map_err(|e| RetrievalFailure::MalformedResponse(e.to_string()))?;

        let mut index = Self::new();
        for entry in entries {
            index.add(&entry.source_id, &entry.text);
        }
        tracing::info!(passages = index.len(), path = %path.display(), "Knowledge corpus loaded");
        Ok(index)
    }

    pub fn add(&mut self, source_id: &str, text: &str) {
        self.entries.push(StoredPassage {
            source_id: source_id.to_string(),
            text: text.to_string(),
            embedding: embed(text),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryKnowledgeIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeIndex for InMemoryKnowledgeIndex {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeSnippet>, RetrievalFailure> {
        let query_embedding = embed(query);

        let mut scored: Vec<(f32, &StoredPassage)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(&query_embedding, &entry.embedding), entry))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| KnowledgeSnippet {
                text: entry.text.clone(),
                source_id: entry.source_id.clone(),
                relevance_score: clamp_unit(score),
            })
            .collect())
    }

    async fn is_available(&self) -> bool {
        !self.entries.is_empty()
    }

    fn name(&self) -> &'static str {
        "in-memory-index"
    }
}

fn embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0_f32; EMBEDDING_DIM];
    for token in word_tokens(text) {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let bucket = (hasher.finish() % EMBEDDING_DIM as u64) as usize;
        vector[bucket] += 1.0;
    }
    vector
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
