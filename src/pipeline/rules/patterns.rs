use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::types::RuleTier;

/// A compiled tier pattern with a label for logs and verdicts.
pub(crate) struct TierPattern {
    pub regex: Regex,
    pub label: &'static str,
}

/// A compiled keyword pattern and the symptom tag it emits.
pub(crate) struct SymptomKeyword {
    pub regex: Regex,
    pub tag: &'static str,
}

pub(crate) static EMERGENCY_PATTERNS: LazyLock<Vec<TierPattern>> = LazyLock::new(|| {
    vec![
        tier(r"(?i)\bchest pain\b", "chest pain"),
        tier(r"(?i)radiating to left arm", "radiating to left arm"),
        tier(
            r"(?i)difficulty breathing|shortness of breath",
            "difficulty breathing",
        ),
        tier(
            r"(?i)slurred speech|face droop|weakness on one side|one side of body",
            "stroke signs",
        ),
        tier(r"(?i)sudden weakness", "sudden weakness"),
    ]
});

pub(crate) static CONSULTATION_PATTERNS: LazyLock<Vec<TierPattern>> = LazyLock::new(|| {
    vec![
        tier(
            r"(?i)\bfever\b.*(3\s*days|three\s*days|39)",
            "persistent fever",
        ),
        tier(
            r"(?i)infected wound|wound.*(red|redness|swelling|pus)",
            "infected wound",
        ),
    ]
});

pub(crate) static SELF_CARE_PATTERNS: LazyLock<Vec<TierPattern>> = LazyLock::new(|| {
    vec![
        tier(r"(?i)common cold|runny nose", "cold symptoms"),
        tier(
            r"(?i)mild headache|slight headache|feeling tired",
            "mild discomfort",
        ),
    ]
});

/// Ordered keyword → tag table. Several keywords may share a tag.
pub(crate) static SYMPTOM_KEYWORDS: LazyLock<Vec<SymptomKeyword>> = LazyLock::new(|| {
    vec![
        keyword(r"(?i)chest pain", "chest pain"),
        keyword(r"(?i)left arm", "arm radiation"),
        keyword(r"(?i)breath|breathing", "breathing difficulty"),
        keyword(r"(?i)slurred speech|weakness", "neurological deficit"),
        keyword(r"(?i)fever|39", "fever"),
        keyword(r"(?i)cough", "cough"),
        keyword(r"(?i)infected wound|wound", "wound infection"),
        keyword(r"(?i)runny nose|cold", "common cold"),
        keyword(r"(?i)headache", "headache"),
    ]
});

/// Chat topics with a canned reply, checked in order.
pub(crate) static CHAT_TOPICS: LazyLock<Vec<ChatTopic>> = LazyLock::new(|| {
    vec![
        topic(
            r"(?i)emergency|urgent|911|112",
            "If you suspect an emergency, call your local emergency number immediately.",
        ),
        topic(
            r"(?i)\bfever",
            "A fever is a temporary rise in body temperature, often due to infection. Seek care if it lasts more than 3 days, is ≥39°C, or if you have severe symptoms.",
        ),
        topic(
            r"(?i)\b(doctor|consult)",
            "See a healthcare professional if symptoms are severe, persistent, or concerning.",
        ),
    ]
});

/// A compiled chat topic and its reply.
pub(crate) struct ChatTopic {
    pub regex: Regex,
    pub reply: &'static str,
}

/// Tiers in evaluation order; the first with a hit wins.
pub(crate) fn tiers() -> [(RuleTier, &'static [TierPattern]); 3] {
    [
        (RuleTier::Emergency, EMERGENCY_PATTERNS.as_slice()),
        (RuleTier::Consultation, CONSULTATION_PATTERNS.as_slice()),
        (RuleTier::SelfCare, SELF_CARE_PATTERNS.as_slice()),
    ]
}

fn tier(re: &str, label: &'static str) -> TierPattern {
    TierPattern {
        regex: Regex::new(re).expect("Invalid tier regex pattern"),
        label,
    }
}

fn topic(re: &str, reply: &'static str) -> ChatTopic {
    ChatTopic {
        regex: Regex::new(re).expect("Invalid chat topic regex pattern"),
        reply,
    }
}

fn keyword(re: &str, tag: &'static str) -> SymptomKeyword {
    SymptomKeyword {
        regex: Regex::new(re).expect("Invalid symptom keyword regex pattern"),
        tag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        assert_eq!(EMERGENCY_PATTERNS.len(), 5);
        assert_eq!(CONSULTATION_PATTERNS.len(), 2);
        assert_eq!(SELF_CARE_PATTERNS.len(), 2);
        assert_eq!(SYMPTOM_KEYWORDS.len(), 9);
        assert_eq!(CHAT_TOPICS.len(), 3);
        assert!(CHAT_TOPICS[0].regex.is_match("Is this an EMERGENCY?"));
    }

    #[test]
    fn tiers_are_in_priority_order() {
        let order: Vec<RuleTier> = tiers().iter().map(|(t, _)| *t).collect();
        assert_eq!(
            order,
            vec![RuleTier::Emergency, RuleTier::Consultation, RuleTier::SelfCare]
        );
    }

    #[test]
    fn chest_pain_needs_word_boundary() {
        let chest = &EMERGENCY_PATTERNS[0].regex;
        assert!(chest.is_match("Severe CHEST PAIN since noon"));
        assert!(!chest.is_match("chest painful"));
    }

    #[test]
    fn fever_needs_duration_or_temperature() {
        let fever = &CONSULTATION_PATTERNS[0].regex;
        assert!(fever.is_match("fever for 3 days"));
        assert!(fever.is_match("Fever of 39 degrees"));
        assert!(fever.is_match("fever three days now"));
        assert!(!fever.is_match("slight fever this morning"));
    }

    #[test]
    fn emergency_topic_matches_inside_words() {
        let emergency = &CHAT_TOPICS[0].regex;
        assert!(emergency.is_match("should I call 911"));
        assert!(emergency.is_match("I urgently need help"));
        assert!(emergency.is_match("EMERGENCY-room visit?"));
    }
}
