//! Decision orchestration: cache, concurrent evidence gathering, synthesis and
//! the fixed fallback order.

pub mod cache;
pub mod engine;
pub mod policy;
pub mod providers;

#[cfg(test)]
mod scenario_tests;

pub use engine::{DecisionOrchestrator, ProviderHealth, SourceHealth};
pub use cache::TriageCache;
pub use policy::{Decision, FallbackPolicy};
pub use providers::Providers;
