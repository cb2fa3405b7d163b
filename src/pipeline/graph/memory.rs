use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::seed::{DISEASES, INDICATES, PART_OF};
use super::{GraphMaintenance, GraphPath, GraphStore, NetworkDisease, SymptomNetwork};
use crate::pipeline::RetrievalFailure;

/// In-process graph store.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    inner: RwLock<GraphData>,
}

#[derive(Debug, Default)]
struct GraphData {
    /// `(symptom, pattern)` → PART_OF weight
    part_of: BTreeMap<(String, String), f32>,
    /// `(pattern, disease)` → INDICATES confidence
    indicates: BTreeMap<(String, String), f32>,
    /// disease → stored urgency
    diseases: BTreeMap<String, Option<String>>,
    symptoms: BTreeSet<String>,
    /// Direct `(symptom, disease)` → confidence links (maintenance model).
    direct: BTreeMap<(String, String), f32>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph seeded with the built-in reference patterns.
    pub fn with_reference_graph() -> Self {
        let mut data = GraphData::default();
        for (symptom, pattern, weight) in PART_OF {
            data.symptoms.insert(symptom.to_string());
            data.part_of
                .insert((symptom.to_string(), pattern.to_string()), *weight);
        }
        for (pattern, disease, confidence) in INDICATES {
            data.indicates
                .insert((pattern.to_string(), disease.to_string()), *confidence);
        }
        for (disease, urgency) in DISEASES {
            data.diseases
                .insert(disease.to_string(), Some(urgency.to_string()));
        }
        Self {
            inner: RwLock::new(data),
        }
    }

    /// Add a two-hop path, creating nodes as needed.
    pub async fn add_path(&self, symptom: &str, pattern: &str, disease: &str, weight: f32, confidence: f32) {
        let mut data = self.inner.write().await;
        data.symptoms.insert(symptom.to_string());
        data.diseases.entry(disease.to_string()).or_insert(None);
        data.part_of
            .insert((symptom.to_string(), pattern.to_string()), weight);
        data.indicates
            .insert((pattern.to_string(), disease.to_string()), confidence);
    }
}

#[async_trait]
impl GraphStore for InMemoryGraph {
    async fn symptom_paths(&self, tokens: &[String]) -> Result<Vec<GraphPath>, RetrievalFailure> {
        let data = self.inner.read().await;
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();

        let mut paths = Vec::new();
        for ((symptom, pattern), weight) in &data.part_of {
            let name = symptom.to_lowercase();
            if !tokens.iter().any(|t| name.contains(t.as_str())) {
                continue;
            }
            for ((indicating, disease), confidence) in &data.indicates {
                if indicating != pattern {
                    continue;
                }
                paths.push(GraphPath {
                    symptom: symptom.clone(),
                    pattern: pattern.clone(),
                    disease: disease.clone(),
                    part_of_weight: *weight,
                    indicates_confidence: *confidence,
                    stored_urgency: data.diseases.get(disease).cloned().flatten(),
                });
            }
        }
        Ok(paths)
    }

    async fn is_available(&self) -> bool {
        !self.inner.read().await.part_of.is_empty()
    }

    fn name(&self) -> &'static str {
        "in-memory-graph"
    }
}

#[async_trait]
impl GraphMaintenance for InMemoryGraph {
    async fn add_symptom_disease(
        &self,
        symptom: &str,
        disease: &str,
        urgency: &str,
        confidence: f32,
    ) -> Result<(), RetrievalFailure> {
        let mut data = self.inner.write().await;
        data.symptoms.insert(symptom.to_string());
        data.diseases
            .insert(disease.to_string(), Some(urgency.to_string()));
        data.direct
            .insert((symptom.to_string(), disease.to_string()), confidence);
        Ok(())
    }

    async fn symptom_network(&self, symptom: &str) -> Result<SymptomNetwork, RetrievalFailure> {
        let data = self.inner.read().await;
        let mut network = SymptomNetwork::default();
        let mut related = BTreeSet::new();

        for ((linked_symptom, disease), confidence) in &data.direct {
            if linked_symptom != symptom {
                continue;
            }
            network.diseases.push(NetworkDisease {
                name: disease.clone(),
                urgency: data.diseases.get(disease).cloned().flatten(),
                confidence: *confidence,
            });
            related.extend(
                data.direct
                    .keys()
                    .filter(|(other, d)| d == disease && other != symptom)
                    .map(|(other, _)| other.clone()),
            );
        }

        network.related_symptoms = related.into_iter().collect();
        Ok(network)
    }
}
