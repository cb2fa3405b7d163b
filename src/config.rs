//! Runtime configuration.
//!
//! Every threshold the decision pipeline applies lives here as a named,
//! overridable value. Sources, lowest precedence first: built-in defaults,
//! a TOML file, then `TRIAGE_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "triage-core";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default `tracing` filter when neither `TRIAGE_LOG` nor `RUST_LOG` is set.
pub fn default_log_filter() -> &'static str {
    "info,triage_core=debug"
}

/// `~/.config/triage-core/config.toml` (platform config dir).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

// ═══════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════

/// Cut-offs used by the relational inferencer and the fallback policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    /// Minimum top-candidate confidence for the relational fallback.
    pub relational_fallback_min_confidence: f32,
    /// Urgency score at or above which a candidate is CRITICAL.
    pub critical_score: f32,
    /// Urgency score at or above which a candidate is MODERATE.
    pub moderate_score: f32,
    /// Score boost per distinct matched symptom.
    pub per_symptom_weight: f32,
    /// Candidates kept after ranking.
    pub max_candidates: usize,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            relational_fallback_min_confidence: 0.6,
            critical_score: 0.85,
            moderate_score: 0.60,
            per_symptom_weight: 0.15,
            max_candidates: 5,
        }
    }
}

/// Confidence assigned by the rule classifier per outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfidence {
    /// Emergency tier with two or more distinct pattern hits.
    pub emergency_multi: f32,
    pub emergency_single: f32,
    pub consultation: f32,
    /// Self-care tier with at least one self-care hit.
    pub self_care_match: f32,
    /// No pattern matched in any tier.
    pub baseline: f32,
}

impl Default for RuleConfidence {
    fn default() -> Self {
        Self {
            emergency_multi: 0.9,
            emergency_single: 0.85,
            consultation: 0.7,
            self_care_match: 0.7,
            baseline: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Queries with fewer word tokens skip the index entirely.
    pub min_query_tokens: usize,
    pub timeout_ms: u64,
    /// HTTP search endpoint. `None` uses the built-in reference index.
    pub endpoint: Option<String>,
    /// JSON corpus (`[{"source_id", "text"}]`) for the in-memory index.
    pub corpus_path: Option<PathBuf>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            min_query_tokens: 3,
            timeout_ms: 2_000,
            endpoint: None,
            corpus_path: None,
        }
    }
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neo4jConfig {
    pub url: String,
    #[serde(default = "default_neo4j_database")]
    pub database: String,
    #[serde(default = "default_neo4j_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

fn default_neo4j_database() -> String {
    "neo4j".to_string()
}

fn default_neo4j_user() -> String {
    "neo4j".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub timeout_ms: u64,
    /// Neo4j HTTP endpoint. `None` uses the built-in reference graph.
    pub neo4j: Option<Neo4jConfig>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            neo4j: None,
        }
    }
}

impl GraphConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub ollama_url: String,
    pub model: String,
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Character budget for retrieved context inside the prompt.
    pub max_context_chars: usize,
    /// Patient text is truncated to this many characters before prompting.
    pub max_input_chars: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout_ms: 60_000,
            connect_timeout_ms: 2_000,
            max_context_chars: 2_400,
            max_input_chars: 1_000,
        }
    }
}

impl SynthesisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached results; least-recently-used entries are evicted.
    pub capacity: usize,
    /// Entries older than this are treated as misses. `None` keeps them
    /// until evicted.
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1_024,
            ttl_secs: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// TriageConfig
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub thresholds: DecisionThresholds,
    pub rules: RuleConfidence,
    pub retrieval: RetrievalConfig,
    pub graph: GraphConfig,
    pub synthesis: SynthesisConfig,
    pub cache: CacheConfig,
}

impl TriageConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default config path is
    /// read when present. Environment overrides are applied last, then the
    /// result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(default_path) => Self::from_file(&default_path)?,
                None => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `TRIAGE_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("TRIAGE_OLLAMA_URL") {
            self.synthesis.ollama_url = url;
        }
        if let Some(model) = lookup("TRIAGE_MODEL") {
            self.synthesis.model = model;
        }
        if let Some(endpoint) = lookup("TRIAGE_KNOWLEDGE_URL") {
            self.retrieval.endpoint = Some(endpoint);
        }
        if let Some(url) = lookup("TRIAGE_NEO4J_URL") {
            let neo4j = self.graph.neo4j.get_or_insert_with(|| Neo4jConfig {
                url: url.clone(),
                database: default_neo4j_database(),
                user: default_neo4j_user(),
                password: String::new(),
            });
            neo4j.url = url;
        }
        if let Some(neo4j) = self.graph.neo4j.as_mut() {
            if let Some(user) = lookup("TRIAGE_NEO4J_USER") {
                neo4j.user = user;
            }
            if let Some(password) = lookup("TRIAGE_NEO4J_PASSWORD") {
                neo4j.password = password;
            }
        }
    }

    /// Reject values the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        check_unit("thresholds.relational_fallback_min_confidence", t.relational_fallback_min_confidence)?;
        check_unit("thresholds.moderate_score", t.moderate_score)?;
        if !(t.critical_score.is_finite() && t.critical_score >= t.moderate_score) {
            return Err(ConfigError::InvalidValue {
                key: "thresholds.critical_score",
                reason: format!(
                    "must be finite and >= moderate_score ({})",
                    t.moderate_score
                ),
            });
        }
        if !(t.per_symptom_weight.is_finite() && t.per_symptom_weight >= 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "thresholds.per_symptom_weight",
                reason: "must be a non-negative number".into(),
            });
        }
        if t.max_candidates == 0 {
            return Err(ConfigError::InvalidValue {
                key: "thresholds.max_candidates",
                reason: "must be at least 1".into(),
            });
        }

        let r = &self.rules;
        check_unit("rules.emergency_multi", r.emergency_multi)?;
        check_unit("rules.emergency_single", r.emergency_single)?;
        check_unit("rules.consultation", r.consultation)?;
        check_unit("rules.self_care_match", r.self_care_match)?;
        check_unit("rules.baseline", r.baseline)?;

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "retrieval.top_k",
                reason: "must be at least 1".into(),
            });
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cache.capacity",
                reason: "must be at least 1".into(),
            });
        }
        if self.synthesis.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "synthesis.model",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

fn check_unit(key: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key,
            reason: format!("{value} is outside [0, 1]"),
        })
    }
}
