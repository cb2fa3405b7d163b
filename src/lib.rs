//! Triage decision core.
//!
//! Merges a deterministic rule classifier, semantic retrieval, a weighted
//! symptom → pattern → disease graph and a generative model into one
//! safety-biased urgency decision. Sources fail independently; the
//! orchestrator always answers.

pub mod config;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, TriageConfig};
pub use pipeline::orchestrator::{DecisionOrchestrator, ProviderHealth, Providers};
pub use pipeline::types::{
    DiseaseCandidate, KnowledgeSnippet, Provenance, RuleTier, SymptomReport, TriageResult,
    UrgencyTier,
};
pub use pipeline::{RetrievalFailure, TriageError};

/// Install the global `tracing` subscriber, writing to stderr.
///
/// Filter precedence: `TRIAGE_LOG`, then `RUST_LOG`, then
/// [`config::default_log_filter`].
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("TRIAGE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
