use serde::Serialize;

use super::patterns::{tiers, CHAT_TOPICS, SYMPTOM_KEYWORDS};
use crate::config::RuleConfidence;
use crate::pipeline::types::{Provenance, RuleTier, TriageResult, UNSPECIFIED_SYMPTOM};
use crate::pipeline::TriageError;

pub const EMERGENCY_ADVICE: &str = "Emergency signs detected. Call your local emergency number or go to the nearest ER immediately. Do not delay seeking care.";
pub const CONSULTATION_ADVICE: &str = "Your symptoms suggest you should see a healthcare professional soon. Book a consultation within 24–48 hours or sooner if symptoms worsen.";
pub const SELF_CARE_ADVICE: &str = "Symptoms appear mild. Rest, stay hydrated, and consider over-the-counter remedies. Seek medical care if symptoms persist or worsen.";

/// Chat reply when no generated answer and no canned topic is available.
pub const CHAT_FALLBACK_REPLY: &str = "I can provide general medical information, but if your symptoms are severe or persistent, please consult a healthcare professional.";

/// Outcome of one rule classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleVerdict {
    pub tier: RuleTier,
    pub confidence: f32,
    pub advice: &'static str,
    pub detected_symptoms: Vec<String>,
    /// Distinct pattern hits in the winning tier. Zero means the no-hit
    /// baseline.
    pub hits: usize,
    /// Labels of the patterns that hit in the winning tier.
    pub matched: Vec<&'static str>,
}

impl RuleVerdict {
    /// At least one pattern of any tier matched.
    pub fn has_evidence(&self) -> bool {
        self.hits > 0
    }

    pub fn is_emergency(&self) -> bool {
        self.tier == RuleTier::Emergency && self.hits > 0
    }

    pub fn into_result(self) -> TriageResult {
        TriageResult::new(
            self.tier.urgency(),
            self.confidence,
            self.advice,
            self.detected_symptoms,
            Provenance::Rules,
        )
    }
}

/// Pattern-based classifier. Stateless apart from its confidence table.
#[derive(Debug, Clone, Default)]
pub struct RuleClassifier {
    confidence: RuleConfidence,
}

impl RuleClassifier {
    pub fn new(confidence: RuleConfidence) -> Self {
        Self { confidence }
    }

    /// Classify `text` into a rule tier. Fails only on blank input.
    pub fn classify(&self, text: &str) -> Result<RuleVerdict, TriageError> {
        if text.trim().is_empty() {
            return Err(TriageError::Validation("Symptoms cannot be empty".into()));
        }

        let detected_symptoms = detect_symptoms(text);

        for (tier, patterns) in tiers() {
            let matched: Vec<&'static str> = patterns
                .iter()
                .filter(|p| p.regex.is_match(text))
                .map(|p| p.label)
                .collect();
            if matched.is_empty() {
                continue;
            }

            let hits = matched.len();
            let (confidence, advice) = match tier {
                RuleTier::Emergency if hits >= 2 => (self.confidence.emergency_multi, EMERGENCY_ADVICE),
                RuleTier::Emergency => (self.confidence.emergency_single, EMERGENCY_ADVICE),
                RuleTier::Consultation => (self.confidence.consultation, CONSULTATION_ADVICE),
                RuleTier::SelfCare => (self.confidence.self_care_match, SELF_CARE_ADVICE),
            };

            tracing::debug!(tier = %tier, hits, "Rule tier matched");
            return Ok(RuleVerdict {
                tier,
                confidence,
                advice,
                detected_symptoms,
                hits,
                matched,
            });
        }

        Ok(RuleVerdict {
            tier: RuleTier::SelfCare,
            confidence: self.confidence.baseline,
            advice: SELF_CARE_ADVICE,
            detected_symptoms,
            hits: 0,
            matched: Vec::new(),
        })
    }
}

/// Symptom tags found in `text`, in table order, without duplicates.
/// Returns `["unspecified"]` when nothing is recognised.
pub fn detect_symptoms(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for keyword in SYMPTOM_KEYWORDS.iter() {
        if keyword.regex.is_match(text) && !tags.iter().any(|t| t == keyword.tag) {
            tags.push(keyword.tag.to_string());
        }
    }
    if tags.is_empty() {
        tags.push(UNSPECIFIED_SYMPTOM.to_string());
    }
    tags
}

/// Canned chat reply for the first recognised topic. An emergency mention
/// always takes precedence.
pub fn chat_reply(message: &str) -> Option<&'static str> {
    CHAT_TOPICS
        .iter()
        .find(|topic| topic.regex.is_match(message))
        .map(|topic| topic.reply)
}
