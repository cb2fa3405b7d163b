use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::TriageError;

/// Oldest age accepted on a symptom report.
pub const MAX_AGE_YEARS: u8 = 120;

/// Tag emitted when no known symptom keyword is found.
pub const UNSPECIFIED_SYMPTOM: &str = "unspecified";

// ═══════════════════════════════════════════════════════════
// Input
// ═══════════════════════════════════════════════════════════

/// A patient's free-text symptom report. Validated on construction,
/// including when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedReport")]
pub struct SymptomReport {
    text: String,
    age: Option<u8>,
    allergies: Option<String>,
}

#[derive(Deserialize)]
struct UncheckedReport {
    text: String,
    #[serde(default)]
    age: Option<u8>,
    #[serde(default)]
    allergies: Option<String>,
}

impl TryFrom<UncheckedReport> for SymptomReport {
    type Error = TriageError;

    fn try_from(raw: UncheckedReport) -> Result<Self, Self::Error> {
        Self::new(raw.text, raw.age, raw.allergies)
    }
}

impl SymptomReport {
    /// Build a report, rejecting blank text and ages above 120.
    pub fn new(
        text: impl Into<String>,
        age: Option<u8>,
        allergies: Option<String>,
    ) -> Result<Self, TriageError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TriageError::Validation("Symptoms cannot be empty".into()));
        }
        if let Some(age) = age {
            if age > MAX_AGE_YEARS {
                return Err(TriageError::Validation(format!(
                    "Age must be between 0 and {MAX_AGE_YEARS} (got {age})"
                )));
            }
        }
        let allergies = allergies
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        Ok(Self {
            text,
            age,
            allergies,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn age(&self) -> Option<u8> {
        self.age
    }

    pub fn allergies(&self) -> Option<&str> {
        self.allergies.as_deref()
    }

    /// Cache key: lower-cased, trimmed text.
    pub fn normalized_key(&self) -> String {
        normalize_text(&self.text)
    }
}

/// Lower-case and trim a report text.
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

// ═══════════════════════════════════════════════════════════
// Urgency vocabularies
// ═══════════════════════════════════════════════════════════

/// Canonical five-level urgency scale, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyTier {
    Critical,
    High,
    Moderate,
    Low,
    Minimal,
}

/// Native three-level vocabulary of the rule classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleTier {
    Emergency,
    Consultation,
    SelfCare,
}

/// Rule tier → canonical tier. The reverse direction is the inverse of this
/// table; HIGH and MINIMAL have no rule counterpart.
pub const RULE_TIER_MAPPING: [(RuleTier, UrgencyTier); 3] = [
    (RuleTier::Emergency, UrgencyTier::Critical),
    (RuleTier::Consultation, UrgencyTier::Moderate),
    (RuleTier::SelfCare, UrgencyTier::Low),
];

impl UrgencyTier {
    pub const ALL: [UrgencyTier; 5] = [
        UrgencyTier::Critical,
        UrgencyTier::High,
        UrgencyTier::Moderate,
        UrgencyTier::Low,
        UrgencyTier::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Moderate => "MODERATE",
            Self::Low => "LOW",
            Self::Minimal => "MINIMAL",
        }
    }

    /// Higher is more urgent.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Moderate => 2,
            Self::Low => 1,
            Self::Minimal => 0,
        }
    }

    /// The more urgent of `self` and `floor`.
    pub fn at_least(self, floor: UrgencyTier) -> UrgencyTier {
        if floor.severity() > self.severity() {
            floor
        } else {
            self
        }
    }

    /// Inverse of [`RULE_TIER_MAPPING`].
    pub fn rule_tier(&self) -> Option<RuleTier> {
        RULE_TIER_MAPPING
            .iter()
            .find(|(_, urgency)| urgency == self)
            .map(|(rule, _)| *rule)
    }

    /// Map a source-specific urgency label onto the canonical scale.
    ///
    /// Accepts the five canonical names in any case plus the rule vocabulary
    /// (`emergency`, `consultation`, `self-care`) and its French originals
    /// (`urgence`, `auto-soin`). Anything else is `None`.
    pub fn canonicalize(label: &str) -> Option<UrgencyTier> {
        let key: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        match key.as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "moderate" => Some(Self::Moderate),
            "low" => Some(Self::Low),
            "minimal" => Some(Self::Minimal),
            _ => RuleTier::from_label(&key).map(|rule| rule.urgency()),
        }
    }
}

impl std::fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RuleTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Consultation => "consultation",
            Self::SelfCare => "self-care",
        }
    }

    /// Canonical tier for this rule tier, read from [`RULE_TIER_MAPPING`].
    pub fn urgency(&self) -> UrgencyTier {
        RULE_TIER_MAPPING
            .iter()
            .find(|(rule, _)| rule == self)
            .map(|(_, urgency)| *urgency)
            .unwrap_or(UrgencyTier::Moderate)
    }

    fn from_label(key: &str) -> Option<RuleTier> {
        match key {
            "emergency" | "urgence" => Some(Self::Emergency),
            "consultation" => Some(Self::Consultation),
            "self_care" | "selfcare" | "auto_soin" => Some(Self::SelfCare),
            _ => None,
        }
    }
}

impl std::fmt::Display for RuleTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════
// Evidence
// ═══════════════════════════════════════════════════════════

/// A passage returned by the knowledge index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub text: String,
    pub source_id: String,
    /// Clamped to [0, 1].
    pub relevance_score: f32,
}

/// A disease ranked by the relational inferencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseCandidate {
    pub disease_name: String,
    pub aggregated_confidence: f32,
    pub matched_symptom_count: u32,
    pub derived_urgency: UrgencyTier,
}

/// Outcome of one best-effort source call.
///
/// Retrieval and inference never fail the pipeline; this records why a
/// source contributed nothing so the decision can be logged and tested.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome<T> {
    Ready(T),
    /// The call was not attempted (input too short, no tokens).
    Skipped(&'static str),
    Failed(String),
    TimedOut(Duration),
}

impl<T: Default> SourceOutcome<T> {
    /// The value, or the empty default for any non-ready outcome.
    pub fn into_value(self) -> T {
        match self {
            Self::Ready(value) => value,
            _ => T::default(),
        }
    }
}

impl<T> SourceOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Short label for structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
            Self::TimedOut(_) => "timed_out",
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Output
// ═══════════════════════════════════════════════════════════

/// Which layer produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Generative,
    Relational,
    Rules,
    SafetyNet,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Generative => "generative",
            Self::Relational => "relational",
            Self::Rules => "rules",
            Self::SafetyNet => "safety_net",
        };
        f.write_str(label)
    }
}

/// The unified triage decision. Always fully populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub urgency_tier: UrgencyTier,
    pub confidence: f32,
    pub advice: String,
    pub detected_symptoms: Vec<String>,
    pub provenance: Provenance,
}

impl TriageResult {
    /// Build a result, enforcing the output invariants: confidence clamped
    /// into [0, 1] (NaN becomes 0), blank symptom tags dropped and an empty
    /// list replaced by the `"unspecified"` sentinel.
    pub fn new(
        urgency_tier: UrgencyTier,
        confidence: f32,
        advice: impl Into<String>,
        detected_symptoms: Vec<String>,
        provenance: Provenance,
    ) -> Self {
        let mut detected_symptoms: Vec<String> = detected_symptoms
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if detected_symptoms.is_empty() {
            detected_symptoms.push(UNSPECIFIED_SYMPTOM.to_string());
        }

        Self {
            urgency_tier,
            confidence: clamp_unit(confidence),
            advice: advice.into(),
            detected_symptoms,
            provenance,
        }
    }
}

/// Clamp into [0, 1]; NaN maps to 0.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
