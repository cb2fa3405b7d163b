//! End-to-end decisions through the orchestrator with mock providers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::DecisionOrchestrator;
use crate::config::TriageConfig;
use crate::pipeline::graph::{GraphPath, InMemoryGraph};
use crate::pipeline::knowledge::InMemoryKnowledgeIndex;
use crate::pipeline::mock::{MockCompletion, MockGraph, MockKnowledge};
use crate::pipeline::synthesis::SynthesisFailure;
use crate::pipeline::types::{KnowledgeSnippet, Provenance, UrgencyTier};
use crate::pipeline::{RetrievalFailure, TriageError};

const SCENARIO_A: &str = "severe chest pain radiating to left arm, difficulty breathing";
const SCENARIO_B: &str = "mild runny nose and slight sore throat";

fn config() -> TriageConfig {
    let mut config = TriageConfig::default();
    config.retrieval.timeout_ms = 1_000;
    config.graph.timeout_ms = 1_000;
    config.synthesis.timeout_ms = 1_000;
    config
}

fn down_completion() -> MockCompletion {
    MockCompletion::failing(SynthesisFailure::Connection("http://localhost:11434".into()))
}

fn down_knowledge() -> MockKnowledge {
    MockKnowledge::failing(RetrievalFailure::Connection("http://index".into()))
}

fn down_graph() -> MockGraph {
    MockGraph::failing(RetrievalFailure::Connection("http://graph".into()))
}

fn generative_reply(urgency: &str, confidence: f32) -> MockCompletion {
    MockCompletion::replying(&format!(
        r#"{{"urgency_level": "{urgency}", "confidence": {confidence}, "advice": "Model advice.", "detected_symptoms": ["model tag"]}}"#
    ))
}

struct Harness {
    orchestrator: DecisionOrchestrator,
    completion: Arc<MockCompletion>,
    knowledge: Arc<MockKnowledge>,
    graph: Arc<MockGraph>,
}

fn harness(completion: MockCompletion, knowledge: MockKnowledge, graph: MockGraph) -> Harness {
    harness_with(config(), completion, knowledge, graph)
}

fn harness_with(
    config: TriageConfig,
    completion: MockCompletion,
    knowledge: MockKnowledge,
    graph: MockGraph,
) -> Harness {
    let completion = Arc::new(completion);
    let knowledge = Arc::new(knowledge);
    let graph = Arc::new(graph);
    let orchestrator =
        DecisionOrchestrator::new(&config, knowledge.clone(), graph.clone(), completion.clone());
    Harness {
        orchestrator,
        completion,
        knowledge,
        graph,
    }
}

fn path(symptom: &str, disease: &str, weight: f32, confidence: f32) -> GraphPath {
    GraphPath {
        symptom: symptom.into(),
        pattern: format!("{disease} pattern"),
        disease: disease.into(),
        part_of_weight: weight,
        indicates_confidence: confidence,
        stored_urgency: None,
    }
}

// ═══════════════════════════════════════════════════════════
// Named scenarios
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn scenario_a_emergency_without_providers() {
    let h = harness(down_completion(), down_knowledge(), down_graph());

    let result = h
        .orchestrator
        .analyze_text(SCENARIO_A, Some(55), None)
        .await
        .unwrap();

    assert_eq!(result.urgency_tier, UrgencyTier::Critical);
    assert!((result.confidence - 0.9).abs() < 1e-6);
    assert!(result.detected_symptoms.contains(&"chest pain".to_string()));
    assert!(result
        .detected_symptoms
        .contains(&"breathing difficulty".to_string()));
    assert_eq!(result.provenance, Provenance::Rules);
}

#[tokio::test]
async fn scenario_a_floor_beats_a_low_model_answer() {
    let h = harness(generative_reply("LOW", 0.6), down_knowledge(), down_graph());

    let result = h
        .orchestrator
        .analyze_text(SCENARIO_A, Some(55), None)
        .await
        .unwrap();

    assert_eq!(result.urgency_tier, UrgencyTier::Critical);
    assert_eq!(result.provenance, Provenance::Generative);
    assert!(result.confidence >= 0.9);
}

#[tokio::test]
async fn scenario_a_with_reference_sources() {
    let config = config();
    let orchestrator = DecisionOrchestrator::new(
        &config,
        Arc::new(InMemoryKnowledgeIndex::with_reference_corpus()),
        Arc::new(InMemoryGraph::with_reference_graph()),
        Arc::new(down_completion()),
    );

    let result = orchestrator
        .analyze_text(SCENARIO_A, Some(55), None)
        .await
        .unwrap();
    assert_eq!(result.urgency_tier, UrgencyTier::Critical);
}

#[tokio::test]
async fn scenario_b_mild_cold_is_low() {
    let h = harness(down_completion(), down_knowledge(), down_graph());

    let result = h
        .orchestrator
        .analyze_text(SCENARIO_B, Some(28), None)
        .await
        .unwrap();

    assert_eq!(result.urgency_tier, UrgencyTier::Low);
    assert!((0.6..=0.7).contains(&result.confidence));
    assert_eq!(result.provenance, Provenance::Rules);
}

#[tokio::test]
async fn scenario_b_with_reference_graph_stays_low() {
    let config = config();
    let orchestrator = DecisionOrchestrator::new(
        &config,
        Arc::new(InMemoryKnowledgeIndex::with_reference_corpus()),
        Arc::new(InMemoryGraph::with_reference_graph()),
        Arc::new(down_completion()),
    );

    let result = orchestrator
        .analyze_text(SCENARIO_B, Some(28), None)
        .await
        .unwrap();
    assert_eq!(result.urgency_tier, UrgencyTier::Low);
    assert!((0.6..=0.7).contains(&result.confidence));
}

#[tokio::test]
async fn scenario_c_relational_fallback() {
    let h = harness(
        down_completion(),
        MockKnowledge::returning(vec![]),
        MockGraph::returning(vec![
            path("lower back ache", "kidney stones", 1.0, 0.75),
            path("back ache", "muscle strain", 0.5, 0.8),
        ]),
    );

    let result = h
        .orchestrator
        .analyze_text("persistent dull ache in my lower back", None, None)
        .await
        .unwrap();

    assert_eq!(result.provenance, Provenance::Relational);
    assert!((result.confidence - 0.75).abs() < 1e-6);
    // 0.75 × 1.15 = 0.8625
    assert_eq!(result.urgency_tier, UrgencyTier::Critical);
    assert_eq!(
        result.advice,
        "kidney stones is a possibility, consult a professional"
    );
    assert_eq!(h.graph.calls(), 1);
}

#[tokio::test]
async fn scenario_d_total_failure_hits_safety_net() {
    let h = harness(down_completion(), down_knowledge(), down_graph());
    let text = "strange tingling in my toes";

    let result = h.orchestrator.analyze_text(text, None, None).await.unwrap();

    assert_eq!(result.urgency_tier, UrgencyTier::Moderate);
    assert_eq!(result.confidence, 0.5);
    assert!(result.advice.contains("consult a healthcare professional"));
    assert_eq!(result.detected_symptoms, vec![text.to_string()]);
    assert_eq!(result.provenance, Provenance::SafetyNet);
}

#[tokio::test]
async fn scenario_d_truncates_long_text() {
    let h = harness(down_completion(), down_knowledge(), down_graph());
    let text = "odd tingling ".repeat(30);

    let result = h.orchestrator.analyze_text(&text, None, None).await.unwrap();

    assert_eq!(result.detected_symptoms[0].chars().count(), 100);
}

#[tokio::test]
async fn scenario_e_blank_input_makes_no_calls() {
    let h = harness(generative_reply("LOW", 0.5), MockKnowledge::returning(vec![]), MockGraph::returning(vec![]));

    for blank in ["", "   ", "\n\t"] {
        assert!(matches!(
            h.orchestrator.analyze_text(blank, None, None).await,
            Err(TriageError::Validation(_))
        ));
    }
    assert!(matches!(
        h.orchestrator.analyze_text("cough", Some(130), None).await,
        Err(TriageError::Validation(_))
    ));

    assert_eq!(h.completion.calls(), 0);
    assert_eq!(h.knowledge.calls(), 0);
    assert_eq!(h.graph.calls(), 0);
}

// ═══════════════════════════════════════════════════════════
// Cross-cutting properties
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn generative_answer_is_used_when_valid() {
    let h = harness(
        generative_reply("HIGH", 0.82),
        MockKnowledge::returning(vec![KnowledgeSnippet {
            text: "Reference text.".into(),
            source_id: "ref".into(),
            relevance_score: 0.7,
        }]),
        MockGraph::returning(vec![path("cough", "bronchitis", 0.9, 0.9)]),
    );

    let result = h
        .orchestrator
        .analyze_text("productive cough for a week", None, None)
        .await
        .unwrap();

    assert_eq!(result.provenance, Provenance::Generative);
    assert_eq!(result.urgency_tier, UrgencyTier::High);
    assert_eq!(result.advice, "Model advice.");

    let messages = h.completion.last_messages();
    let prompt = &messages[1].content;
    assert!(prompt.contains("Reference text."));
    assert!(prompt.contains("bronchitis"));
}

#[tokio::test]
async fn cache_returns_identical_result_for_normalized_text() {
    let h = harness(generative_reply("MODERATE", 0.66), MockKnowledge::returning(vec![]), MockGraph::returning(vec![]));

    let first = h
        .orchestrator
        .analyze_text("Fever and cough since Monday", None, None)
        .await
        .unwrap();
    let second = h
        .orchestrator
        .analyze_text("  fever and COUGH since monday \n", Some(70), None)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(h.completion.calls(), 1);
    assert_eq!(h.graph.calls(), 1);
}

#[tokio::test]
async fn concurrent_requests_for_one_key_leave_one_entry() {
    let h = harness(
        generative_reply("MODERATE", 0.66).with_delay(Duration::from_millis(50)),
        MockKnowledge::returning(vec![]),
        MockGraph::returning(vec![]),
    );

    let (first, second) = tokio::join!(
        h.orchestrator.analyze_text("Fever and cough since Monday", None, None),
        h.orchestrator.analyze_text("  fever and COUGH since monday", None, None)
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first, second);
    assert_eq!(h.orchestrator.cache().len().await, 1);
    let cached = h
        .orchestrator
        .cache()
        .get("fever and cough since monday")
        .await
        .unwrap();
    assert_eq!(cached, first);
    assert!(h.completion.calls() <= 2);
}

#[tokio::test]
async fn safety_net_results_are_not_cached() {
    let h = harness(down_completion(), down_knowledge(), down_graph());

    h.orchestrator
        .analyze_text("strange tingling in my toes", None, None)
        .await
        .unwrap();
    h.orchestrator
        .analyze_text("strange tingling in my toes", None, None)
        .await
        .unwrap();

    assert_eq!(h.completion.calls(), 2);
    assert!(h.orchestrator.cache().is_empty().await);
}

#[tokio::test]
async fn confidence_is_clamped() {
    let h = harness(generative_reply("LOW", 3.5), MockKnowledge::returning(vec![]), MockGraph::returning(vec![]));

    let result = h
        .orchestrator
        .analyze_text("slight itch on my forearm", None, None)
        .await
        .unwrap();
    assert_eq!(result.confidence, 1.0);
    assert!(UrgencyTier::ALL.contains(&result.urgency_tier));
}

#[tokio::test]
async fn one_failing_source_does_not_empty_the_other() {
    let h = harness(
        down_completion(),
        down_knowledge(),
        MockGraph::returning(vec![path("rash", "shingles", 0.8, 0.9)]),
    );

    let result = h
        .orchestrator
        .analyze_text("painful rash on one side of my back", None, None)
        .await
        .unwrap();

    assert_eq!(h.knowledge.calls(), 1);
    // "one side of body" is not matched; the graph answer stands.
    assert_eq!(result.provenance, Provenance::Relational);
    assert!(result.advice.starts_with("shingles"));
}

#[tokio::test]
async fn slow_source_times_out_without_failing_the_request() {
    let mut config = config();
    config.retrieval.timeout_ms = 50;
    let h = harness_with(
        config,
        generative_reply("LOW", 0.7),
        MockKnowledge::returning(vec![]).with_delay(Duration::from_secs(10)),
        MockGraph::returning(vec![]),
    );

    let started = Instant::now();
    let result = h
        .orchestrator
        .analyze_text("slight itch on my forearm", None, None)
        .await
        .unwrap();

    assert_eq!(result.provenance, Provenance::Generative);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn retrieval_and_inference_run_concurrently() {
    let delay = Duration::from_millis(400);
    let h = harness(
        generative_reply("LOW", 0.7),
        MockKnowledge::returning(vec![]).with_delay(delay),
        MockGraph::returning(vec![]).with_delay(delay),
    );

    let started = Instant::now();
    h.orchestrator
        .analyze_text("slight itch on my forearm", None, None)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_millis(750));
}

#[tokio::test]
async fn cancelled_request_leaves_no_cache_entry() {
    let h = harness(
        generative_reply("LOW", 0.7).with_delay(Duration::from_secs(10)),
        MockKnowledge::returning(vec![]),
        MockGraph::returning(vec![]),
    );

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        h.orchestrator.analyze_text("slight itch on my forearm", None, None),
    )
    .await;

    assert!(outcome.is_err());
    assert!(h.orchestrator.cache().is_empty().await);
}
