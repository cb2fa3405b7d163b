use crate::pipeline::rules::classifier::EMERGENCY_ADVICE;
use crate::pipeline::rules::RuleVerdict;
use crate::pipeline::types::{
    DiseaseCandidate, Provenance, SourceOutcome, TriageResult, UrgencyTier,
};

pub const SAFETY_NET_ADVICE: &str =
    "Unable to analyze symptoms with AI. Please consult a healthcare professional.";
pub const SAFETY_NET_CONFIDENCE: f32 = 0.5;
/// Characters of raw text kept as the safety-net symptom tag.
pub const SAFETY_NET_TAG_CHARS: usize = 100;

/// Final decision and how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub result: TriageResult,
    /// The emergency floor raised the tier.
    pub floor_applied: bool,
}

impl Decision {
    /// Safety-net answers are never cached so a recovered provider gets a
    /// chance on the next identical report.
    pub fn is_cacheable(&self) -> bool {
        self.result.provenance != Provenance::SafetyNet
    }
}

/// Fixed-priority merge of per-source outcomes. Pure: no I/O, no clock.
#[derive(Debug, Clone, Copy)]
pub struct FallbackPolicy {
    relational_min_confidence: f32,
}

impl FallbackPolicy {
    pub fn new(relational_min_confidence: f32) -> Self {
        Self {
            relational_min_confidence,
        }
    }

    /// Pick the first qualifying layer (generative, relational, rules, safety
    /// net), then apply the emergency floor.
    pub fn resolve(
        &self,
        synthesis: SourceOutcome<TriageResult>,
        candidates: &SourceOutcome<Vec<DiseaseCandidate>>,
        rules: &RuleVerdict,
        raw_text: &str,
    ) -> Decision {
        let result = match synthesis {
            SourceOutcome::Ready(result) => result,
            _ => self
                .relational(candidates, rules)
                .or_else(|| rules.has_evidence().then(|| rules.clone().into_result()))
                .unwrap_or_else(|| safety_net(raw_text)),
        };
        apply_emergency_floor(result, rules)
    }

    fn relational(
        &self,
        candidates: &SourceOutcome<Vec<DiseaseCandidate>>,
        rules: &RuleVerdict,
    ) -> Option<TriageResult> {
        let SourceOutcome::Ready(candidates) = candidates else {
            return None;
        };
        let top = candidates.first()?;
        if top.aggregated_confidence < self.relational_min_confidence {
            return None;
        }
        Some(TriageResult::new(
            top.derived_urgency,
            top.aggregated_confidence,
            format!(
                "{} is a possibility, consult a professional",
                top.disease_name
            ),
            rules.detected_symptoms.clone(),
            Provenance::Relational,
        ))
    }
}

/// Last-resort answer: MODERATE, fixed advice, raw text as the symptom tag.
pub fn safety_net(raw_text: &str) -> TriageResult {
    let tag: String = raw_text.trim().chars().take(SAFETY_NET_TAG_CHARS).collect();
    TriageResult::new(
        UrgencyTier::Moderate,
        SAFETY_NET_CONFIDENCE,
        SAFETY_NET_ADVICE,
        vec![tag],
        Provenance::SafetyNet,
    )
}

/// A rule-level emergency always yields CRITICAL. When the floor raises the
/// tier the advice is replaced with the emergency advice and the rule tags
/// are merged in.
fn apply_emergency_floor(mut result: TriageResult, rules: &RuleVerdict) -> Decision {
    if !rules.is_emergency() || result.urgency_tier == UrgencyTier::Critical {
        return Decision {
            result,
            floor_applied: false,
        };
    }

    result.urgency_tier = result.urgency_tier.at_least(UrgencyTier::Critical);
    result.confidence = result.confidence.max(rules.confidence);
    result.advice = EMERGENCY_ADVICE.to_string();
    for tag in &rules.detected_symptoms {
        if !result.detected_symptoms.contains(tag) {
            result.detected_symptoms.push(tag.clone());
        }
    }
    Decision {
        result: TriageResult::new(
            result.urgency_tier,
            result.confidence,
            result.advice,
            result.detected_symptoms,
            result.provenance,
        ),
        floor_applied: true,
    }
}
