use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use super::{GraphPath, GraphStore};
use crate::config::{DecisionThresholds, GraphConfig};
use crate::pipeline::knowledge::word_tokens;
use crate::pipeline::types::{clamp_unit, DiseaseCandidate, SourceOutcome, UrgencyTier};

/// Shortest token sent to the graph.
const MIN_TOKEN_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "and", "the", "for", "with", "have", "has", "had", "since", "from", "that", "this", "very",
    "feel", "feeling", "also", "but", "not", "are", "was", "were", "been", "some", "after",
    "about", "into", "over", "when", "then", "than", "there", "their", "them", "they", "its",
    "our", "your", "you", "can", "get", "got", "any", "all", "much", "more", "just",
];

/// Query tokens: lower-cased alphanumeric words of at least three characters,
/// stop words removed, first occurrence kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    word_tokens(text)
        .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Urgency from `confidence × (1 + per_symptom_weight × matched)`.
pub fn derive_urgency(confidence: f32, matched: u32, thresholds: &DecisionThresholds) -> UrgencyTier {
    let score = confidence * (1.0 + thresholds.per_symptom_weight * matched as f32);
    if score >= thresholds.critical_score {
        UrgencyTier::Critical
    } else if score >= thresholds.moderate_score {
        UrgencyTier::Moderate
    } else {
        UrgencyTier::Low
    }
}

/// Group paths by disease and rank the diseases.
///
/// Duplicate paths count once. Confidence is the mean of
/// `part_of_weight × indicates_confidence` over a disease's paths. Ranking is
/// confidence descending, then name ascending.
pub fn aggregate_paths(paths: &[GraphPath], thresholds: &DecisionThresholds) -> Vec<DiseaseCandidate> {
    struct Group<'a> {
        products: Vec<f32>,
        symptoms: HashSet<&'a str>,
    }

    let mut seen: HashSet<(&str, &str, &str)> = HashSet::new();
    let mut groups: BTreeMap<&str, Group> = BTreeMap::new();

    for path in paths {
        if !seen.insert((path.symptom.as_str(), path.pattern.as_str(), path.disease.as_str())) {
            continue;
        }
        let group = groups.entry(path.disease.as_str()).or_insert_with(|| Group {
            products: Vec::new(),
            symptoms: HashSet::new(),
        });
        group
            .products
            .push(clamp_unit(path.part_of_weight) * clamp_unit(path.indicates_confidence));
        group.symptoms.insert(path.symptom.as_str());
    }

    let mut candidates: Vec<DiseaseCandidate> = groups
        .into_iter()
        .map(|(disease, group)| {
            let mean = group.products.iter().sum::<f32>() / group.products.len() as f32;
            let confidence = clamp_unit(mean);
            let matched = group.symptoms.len() as u32;
            DiseaseCandidate {
                disease_name: disease.to_string(),
                aggregated_confidence: confidence,
                matched_symptom_count: matched,
                derived_urgency: derive_urgency(confidence, matched, thresholds),
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.aggregated_confidence
            .partial_cmp(&a.aggregated_confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.disease_name.cmp(&b.disease_name))
    });
    candidates.truncate(thresholds.max_candidates);
    candidates
}

/// Best-effort disease ranking from the graph store.
pub struct RelationalInferencer {
    store: Arc<dyn GraphStore>,
    thresholds: DecisionThresholds,
    timeout: Duration,
}

impl RelationalInferencer {
    pub fn new(store: Arc<dyn GraphStore>, thresholds: DecisionThresholds, config: &GraphConfig) -> Self {
        Self {
            store,
            thresholds,
            timeout: config.timeout(),
        }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn infer(&self, text: &str) -> SourceOutcome<Vec<DiseaseCandidate>> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return SourceOutcome::Skipped("no usable tokens");
        }

        match tokio::time::timeout(self.timeout, self.store.symptom_paths(&tokens)).await {
            Ok(Ok(paths)) => {
                let candidates = aggregate_paths(&paths, &self.thresholds);
                tracing::debug!(
                    store = self.store.name(),
                    tokens = tokens.len(),
                    paths = paths.len(),
                    candidates = candidates.len(),
                    "Relational inference complete"
                );
                SourceOutcome::Ready(candidates)
            }
            Ok(Err(e)) => {
                tracing::warn!(store = self.store.name(), error = %e, "Graph query failed");
                SourceOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    store = self.store.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Graph query timed out"
                );
                SourceOutcome::TimedOut(self.timeout)
            }
        }
    }
}
