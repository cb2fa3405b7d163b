use std::sync::Arc;

use crate::config::{ConfigError, TriageConfig};
use crate::pipeline::graph::{GraphMaintenance, GraphStore, InMemoryGraph, Neo4jGraph};
use crate::pipeline::knowledge::{HttpKnowledgeIndex, InMemoryKnowledgeIndex, KnowledgeIndex};
use crate::pipeline::synthesis::{CompletionProvider, OllamaChatClient};

/// Provider handles wired from configuration.
///
/// The graph store and its maintenance side are the same backend seen
/// through two traits.
#[derive(Clone)]
pub struct Providers {
    pub index: Arc<dyn KnowledgeIndex>,
    pub graph: Arc<dyn GraphStore>,
    pub maintenance: Arc<dyn GraphMaintenance>,
    pub completion: Arc<dyn CompletionProvider>,
}

impl Providers {
    /// HTTP index when an endpoint is set, else the in-memory index (from
    /// `corpus_path` or the reference corpus). Neo4j when configured, else
    /// the reference in-memory graph. Ollama for completions.
    pub fn from_config(config: &TriageConfig) -> Result<Self, ConfigError> {
        let connect_timeout = config.synthesis.connect_timeout();

        let index: Arc<dyn KnowledgeIndex> = match (&config.retrieval.endpoint, &config.retrieval.corpus_path) {
            (Some(endpoint), _) => Arc::new(HttpKnowledgeIndex::new(endpoint, connect_timeout)),
            (None, Some(path)) => Arc::new(InMemoryKnowledgeIndex::from_json_file(path).map_err(|e| {
                ConfigError::InvalidValue {
                    key: "retrieval.corpus_path",
                    reason: e.to_string(),
                }
            })?),
            (None, None) => Arc::new(InMemoryKnowledgeIndex::with_reference_corpus()),
        };

        let (graph, maintenance): (Arc<dyn GraphStore>, Arc<dyn GraphMaintenance>) =
            match &config.graph.neo4j {
                Some(neo4j) => {
                    let store = Arc::new(Neo4jGraph::new(neo4j, connect_timeout));
                    let graph: Arc<dyn GraphStore> = store.clone();
                    let maintenance: Arc<dyn GraphMaintenance> = store;
                    (graph, maintenance)
                }
                None => {
                    let store = Arc::new(InMemoryGraph::with_reference_graph());
                    let graph: Arc<dyn GraphStore> = store.clone();
                    let maintenance: Arc<dyn GraphMaintenance> = store;
                    (graph, maintenance)
                }
            };

        let completion: Arc<dyn CompletionProvider> = Arc::new(OllamaChatClient::new(&config.synthesis));

        tracing::info!(
            index = index.name(),
            graph = graph.name(),
            completion = completion.name(),
            model = %config.synthesis.model,
            "Providers configured"
        );

        Ok(Self {
            index,
            graph,
            maintenance,
            completion,
        })
    }
}
