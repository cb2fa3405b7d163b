use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use super::cache::TriageCache;
use super::policy::FallbackPolicy;
use super::providers::Providers;
use crate::config::{ConfigError, TriageConfig};
use crate::pipeline::graph::{GraphStore, RelationalInferencer};
use crate::pipeline::knowledge::{KnowledgeIndex, KnowledgeRetriever};
use crate::pipeline::rules::classifier::{chat_reply, CHAT_FALLBACK_REPLY};
use crate::pipeline::rules::RuleClassifier;
use crate::pipeline::synthesis::{
    ChatMessage, CompletionProvider, GenerativeSynthesizer, SynthesisFailure,
};
use crate::pipeline::types::{
    DiseaseCandidate, KnowledgeSnippet, SourceOutcome, SymptomReport, TriageResult,
};
use crate::pipeline::TriageError;

/// Availability of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceHealth {
    pub name: &'static str,
    pub available: bool,
}

/// Availability of every provider at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderHealth {
    pub checked_at: DateTime<Utc>,
    pub knowledge: SourceHealth,
    pub graph: SourceHealth,
    pub completion: SourceHealth,
    /// The rule classifier has no dependency and is always up.
    pub rules: bool,
}

impl ProviderHealth {
    /// Some external source is down; answers may come from a fallback layer.
    pub fn is_degraded(&self) -> bool {
        !(self.knowledge.available && self.graph.available && self.completion.available)
    }
}

/// Root of the decision pipeline.
///
/// Every valid report gets a result: failed sources are absorbed and the
/// fallback order ends in a fixed safety-net answer.
pub struct DecisionOrchestrator {
    rules: RuleClassifier,
    retriever: KnowledgeRetriever,
    inferencer: RelationalInferencer,
    synthesizer: GenerativeSynthesizer,
    policy: FallbackPolicy,
    cache: Arc<TriageCache>,
}

impl DecisionOrchestrator {
    pub fn new(
        config: &TriageConfig,
        index: Arc<dyn KnowledgeIndex>,
        graph: Arc<dyn GraphStore>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            rules: RuleClassifier::new(config.rules.clone()),
            retriever: KnowledgeRetriever::new(index, &config.retrieval),
            inferencer: RelationalInferencer::new(graph, config.thresholds.clone(), &config.graph),
            synthesizer: GenerativeSynthesizer::new(completion, &config.synthesis),
            policy: FallbackPolicy::new(config.thresholds.relational_fallback_min_confidence),
            cache: Arc::new(TriageCache::from_config(&config.cache)),
        }
    }

    pub fn from_providers(config: &TriageConfig, providers: &Providers) -> Self {
        Self::new(
            config,
            providers.index.clone(),
            providers.graph.clone(),
            providers.completion.clone(),
        )
    }

    pub fn from_config(config: &TriageConfig) -> Result<Self, ConfigError> {
        let providers = Providers::from_config(config)?;
        Ok(Self::from_providers(config, &providers))
    }

    /// Share a cache between orchestrators.
    pub fn with_cache(mut self, cache: Arc<TriageCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<TriageCache> {
        &self.cache
    }

    /// Validate raw input, then [`Self::analyze`].
    pub async fn analyze_text(
        &self,
        text: &str,
        age: Option<u8>,
        allergies: Option<String>,
    ) -> Result<TriageResult, TriageError> {
        let report = SymptomReport::new(text, age, allergies)?;
        self.analyze(&report).await
    }

    /// Triage one report.
    pub async fn analyze(&self, report: &SymptomReport) -> Result<TriageResult, TriageError> {
        let span = tracing::info_span!("triage", request_id = %Uuid::new_v4());
        self.analyze_inner(report).instrument(span).await
    }

    async fn analyze_inner(&self, report: &SymptomReport) -> Result<TriageResult, TriageError> {
        let started = Instant::now();
        let text = report.text();

        // Step 1: Cache
        let key = report.normalized_key();
        if let Some(hit) = self.cache.get(&key).await {
            tracing::info!(provenance = %hit.provenance, urgency = %hit.urgency_tier, "Cache hit");
            return Ok(hit);
        }
        tracing::debug!(chars = text.chars().count(), "Cache miss");

        // Step 2: Rules (no I/O; feeds the emergency floor and the fallback)
        let verdict = self.rules.classify(text)?;
        if verdict.is_emergency() {
            tracing::warn!(hits = verdict.hits, "Emergency pattern matched");
        }

        // Step 3: Knowledge and graph concurrently, each under its own timeout
        let (knowledge, candidates) =
            tokio::join!(self.retriever.retrieve(text), self.inferencer.infer(text));
        tracing::debug!(
            knowledge = knowledge.label(),
            graph = candidates.label(),
            "Evidence gathered"
        );

        // Step 4: Synthesis
        let synthesis = {
            let snippets: &[KnowledgeSnippet] = match &knowledge {
                SourceOutcome::Ready(snippets) => snippets.as_slice(),
                _ => &[],
            };
            let ranked: &[DiseaseCandidate] = match &candidates {
                SourceOutcome::Ready(ranked) => ranked.as_slice(),
                _ => &[],
            };
            match self
                .synthesizer
                .synthesize_triage(report, snippets, ranked)
                .await
            {
                Ok(result) => SourceOutcome::Ready(result),
                Err(SynthesisFailure::Timeout(ms)) => {
                    tracing::warn!(timeout_ms = ms, "Synthesis timed out");
                    SourceOutcome::TimedOut(Duration::from_millis(ms))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Synthesis failed");
                    SourceOutcome::Failed(e.to_string())
                }
            }
        };

        // Step 5: Fallback order and emergency floor
        let decision = self.policy.resolve(synthesis, &candidates, &verdict, text);

        // Step 6: Cache the complete result
        if decision.is_cacheable() {
            self.cache.put(key, decision.result.clone()).await;
        }

        tracing::info!(
            provenance = %decision.result.provenance,
            urgency = %decision.result.urgency_tier,
            confidence = decision.result.confidence,
            floor_applied = decision.floor_applied,
            latency_ms = started.elapsed().as_millis() as u64,
            "Triage decided"
        );

        Ok(decision.result)
    }

    /// Educational chat. No retrieval or graph augmentation.
    ///
    /// When the generative call fails the reply is a canned topic answer
    /// (an emergency mention first) or a fixed supportive message.
    pub async fn chat(&self, message: &str, history: &[ChatMessage]) -> Result<String, TriageError> {
        if message.trim().is_empty() {
            return Err(TriageError::Validation("Message cannot be empty".into()));
        }

        let span = tracing::info_span!("chat", request_id = %Uuid::new_v4());
        let reply = async {
            match self.synthesizer.chat(message, history).await {
                Ok(reply) => {
                    tracing::info!(history_turns = history.len(), "Chat answered");
                    reply
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Chat synthesis failed, using canned reply");
                    chat_reply(message).unwrap_or(CHAT_FALLBACK_REPLY).to_string()
                }
            }
        }
        .instrument(span)
        .await;
        Ok(reply)
    }

    /// Probe every provider concurrently. Each probe is bounded by its
    /// source's timeout; a probe that does not answer in time reads as down.
    pub async fn health(&self) -> ProviderHealth {
        let index = self.retriever.index();
        let graph = self.inferencer.store();
        let completion = self.synthesizer.provider();

        let (knowledge_up, graph_up, completion_up) = tokio::join!(
            probe_within(index.name(), self.retriever.timeout(), index.is_available()),
            probe_within(graph.name(), self.inferencer.timeout(), graph.is_available()),
            probe_within(
                completion.name(),
                self.synthesizer.timeout(),
                completion.is_available()
            )
        );

        let health = ProviderHealth {
            checked_at: Utc::now(),
            knowledge: SourceHealth {
                name: index.name(),
                available: knowledge_up,
            },
            graph: SourceHealth {
                name: graph.name(),
                available: graph_up,
            },
            completion: SourceHealth {
                name: completion.name(),
                available: completion_up,
            },
            rules: true,
        };
        tracing::info!(
            knowledge = knowledge_up,
            graph = graph_up,
            completion = completion_up,
            "Provider health checked"
        );
        health
    }
}

async fn probe_within(
    source: &'static str,
    limit: Duration,
    check: impl std::future::Future<Output = bool>,
) -> bool {
    match tokio::time::timeout(limit, check).await {
        Ok(up) => up,
        Err(_) => {
            tracing::warn!(
                source,
                timeout_ms = limit.as_millis() as u64,
                "Health probe timed out"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::mock::{MockCompletion, MockGraph, MockKnowledge};
    use crate::pipeline::RetrievalFailure;

    fn orchestrator(completion: MockCompletion) -> (DecisionOrchestrator, Arc<MockCompletion>) {
        let completion = Arc::new(completion);
        let orchestrator = DecisionOrchestrator::new(
            &TriageConfig::default(),
            Arc::new(MockKnowledge::returning(vec![])),
            Arc::new(MockGraph::returning(vec![])),
            completion.clone(),
        );
        (orchestrator, completion)
    }

    #[tokio::test]
    async fn chat_returns_generated_reply() {
        let (orchestrator, mock) = orchestrator(MockCompletion::replying("Drink fluids."));
        let reply = orchestrator.chat("what helps a cold", &[]).await.unwrap();
        assert_eq!(reply, "Drink fluids.");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn chat_falls_back_to_supportive_message() {
        let (orchestrator, _) = orchestrator(MockCompletion::failing(SynthesisFailure::EmptyResponse));
        let reply = orchestrator.chat("what helps a cold", &[]).await.unwrap();
        assert_eq!(reply, CHAT_FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn chat_fallback_reminds_of_emergency_number() {
        let (orchestrator, _) = orchestrator(MockCompletion::failing(SynthesisFailure::Connection(
            "http://localhost:11434".into(),
        )));
        let reply = orchestrator
            .chat("is this an emergency? my chest hurts", &[])
            .await
            .unwrap();
        assert!(reply.contains("call your local emergency number"));
    }

    #[tokio::test]
    async fn chat_fallback_catches_emergency_word_forms() {
        let (orchestrator, _) = orchestrator(MockCompletion::failing(SynthesisFailure::EmptyResponse));
        let reply = orchestrator.chat("I urgently need help", &[]).await.unwrap();
        assert!(reply.contains("call your local emergency number"));
    }

    #[tokio::test]
    async fn blank_chat_is_rejected_before_any_call() {
        let (orchestrator, mock) = orchestrator(MockCompletion::replying("hi"));
        assert!(matches!(
            orchestrator.chat("   ", &[]).await,
            Err(TriageError::Validation(_))
        ));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn health_reports_each_source() {
        let orchestrator = DecisionOrchestrator::new(
            &TriageConfig::default(),
            Arc::new(MockKnowledge::returning(vec![])),
            Arc::new(MockGraph::failing(RetrievalFailure::Connection("neo4j".into()))),
            Arc::new(MockCompletion::replying("ok")),
        );
        let health = orchestrator.health().await;
        assert!(health.knowledge.available);
        assert!(!health.graph.available);
        assert_eq!(health.graph.name, "mock-graph");
        assert!(health.completion.available);
        assert!(health.rules);
        assert!(health.is_degraded());
    }

    #[tokio::test]
    async fn unresponsive_sources_read_as_down() {
        let mut config = TriageConfig::default();
        config.retrieval.timeout_ms = 100;
        config.graph.timeout_ms = 100;
        let orchestrator = DecisionOrchestrator::new(
            &config,
            Arc::new(MockKnowledge::returning(vec![]).with_delay(Duration::from_secs(3600))),
            Arc::new(MockGraph::returning(vec![]).with_delay(Duration::from_secs(3600))),
            Arc::new(MockCompletion::replying("ok")),
        );

        let started = Instant::now();
        let health = tokio::time::timeout(Duration::from_secs(3), orchestrator.health())
            .await
            .expect("health must answer within the source timeouts");
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!health.knowledge.available);
        assert!(!health.graph.available);
        assert!(health.completion.available);
        assert!(health.is_degraded());
    }

    #[tokio::test]
    async fn shared_cache_is_used() {
        let cache = Arc::new(TriageCache::new(8, None));
        let (orchestrator, _) = orchestrator(MockCompletion::failing(SynthesisFailure::EmptyResponse));
        let orchestrator = orchestrator.with_cache(cache.clone());

        orchestrator
            .analyze_text("mild headache after work", None, None)
            .await
            .unwrap();
        assert_eq!(cache.len().await, 1);
    }
}
