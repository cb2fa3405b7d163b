//! Relational inference over a symptom → clinical pattern → disease graph.
//!
//! The decision path reads two-hop `(Symptom)-[PART_OF]->(ClinicalPattern)
//! -[INDICATES]->(Disease)` paths only. Direct symptom → disease links and the
//! urgency stored on disease nodes exist for maintenance and inspection and
//! never feed a decision.

pub mod inference;
pub mod memory;
pub mod neo4j;
mod seed;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RetrievalFailure;

pub use inference::RelationalInferencer;
pub use memory::InMemoryGraph;
pub use neo4j::Neo4jGraph;

/// One symptom → pattern → disease path with its edge weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPath {
    pub symptom: String,
    pub pattern: String,
    pub disease: String,
    pub part_of_weight: f32,
    pub indicates_confidence: f32,
    /// Urgency label stored on the disease node. Informational only.
    pub stored_urgency: Option<String>,
}

/// Read side used by the decision pipeline.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Every path whose symptom name contains one of `tokens`
    /// (case-insensitive substring).
    async fn symptom_paths(&self, tokens: &[String]) -> Result<Vec<GraphPath>, RetrievalFailure>;

    async fn is_available(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Write and inspection side, used outside the decision path.
#[async_trait]
pub trait GraphMaintenance: Send + Sync {
    /// Create or update a direct symptom → disease link. Existing nodes and
    /// links are merged; the disease urgency and link confidence are
    /// overwritten.
    async fn add_symptom_disease(
        &self,
        symptom: &str,
        disease: &str,
        urgency: &str,
        confidence: f32,
    ) -> Result<(), RetrievalFailure>;

    /// Diseases directly linked to `symptom` and the other symptoms linked to
    /// those diseases.
    async fn symptom_network(&self, symptom: &str) -> Result<SymptomNetwork, RetrievalFailure>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymptomNetwork {
    pub diseases: Vec<NetworkDisease>,
    pub related_symptoms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDisease {
    pub name: String,
    pub urgency: Option<String>,
    pub confidence: f32,
}

/// Default link confidence for [`GraphMaintenance::add_symptom_disease`].
pub const DEFAULT_LINK_CONFIDENCE: f32 = 0.7;
