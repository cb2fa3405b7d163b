use std::sync::LazyLock;

use regex::Regex;

/// What sanitization changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextModification {
    InvisibleUnicodeRemoved,
    ControlCharacterRemoved,
    InjectionPatternRemoved,
    Truncated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedText {
    pub text: String,
    pub modifications: Vec<TextModification>,
}

impl SanitizedText {
    pub fn was_modified(&self) -> bool {
        !self.modifications.is_empty()
    }
}

static INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Role override attempts
        r"(?i)ignore\s+(?:previous|above|all\s+prior|the\s+above)\s+(?:instructions?|rules?|prompts?)",
        r"(?i)forget\s+(?:everything|all|your)\s+(?:previous|prior)?",
        r"(?i)new\s+instructions?:",
        r"(?i)you\s+are\s+now\s+(?:a|an)\s+",
        // System/role tags
        r"(?i)system\s*:",
        r"(?i)assistant\s*:",
        r"<<SYS>>",
        r"\[INST\]",
        r"<\|im_start\|>",
        r"<\|im_end\|>",
        r"(?i)</?PATIENT_SYMPTOMS>",
        // Output steering
        r#"(?i)"?urgency_level"?\s*[:=]"#,
        r"(?i)(?:respond|answer|reply)\s+(?:only\s+)?with\s+(?:urgency\s+)?(?:minimal|low)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid injection regex pattern"))
    .collect()
});

/// Clean patient text before it enters any prompt.
///
/// Strips invisible Unicode and control characters (newline and tab kept),
/// replaces prompt-injection markers with `[FILTERED]`, then truncates to
/// `max_chars` characters at a word boundary when possible.
pub fn sanitize_patient_text(raw: &str, max_chars: usize) -> SanitizedText {
    let mut modifications = Vec::new();

    let text = remove_invisible_unicode(raw);
    if text != raw {
        modifications.push(TextModification::InvisibleUnicodeRemoved);
    }

    let before = text;
    let text = remove_control_characters(&before);
    if text != before {
        modifications.push(TextModification::ControlCharacterRemoved);
    }

    let before = text;
    let text = remove_injection_patterns(&before);
    if text != before {
        modifications.push(TextModification::InjectionPatternRemoved);
    }

    let text = if text.chars().count() > max_chars {
        modifications.push(TextModification::Truncated);
        truncate_at_word_boundary(&text, max_chars)
    } else {
        text
    };

    if !modifications.is_empty() {
        tracing::debug!(?modifications, "Patient text sanitized");
    }

    SanitizedText {
        text,
        modifications,
    }
}

fn remove_invisible_unicode(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}'..='\u{200F}'   // Zero-width chars
                | '\u{202A}'..='\u{202E}' // Directional formatting
                | '\u{2060}'..='\u{2064}' // Invisible operators
                | '\u{2066}'..='\u{2069}' // Directional isolates
                | '\u{FEFF}'              // BOM
                | '\u{00AD}'              // Soft hyphen
                | '\u{034F}'              // Combining grapheme joiner
                | '\u{061C}'              // Arabic letter mark
                | '\u{180E}'              // Mongolian vowel separator
            )
        })
        .collect()
}

fn remove_control_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

fn remove_injection_patterns(text: &str) -> String {
    let mut result = text.to_string();
    for pattern in INJECTION_PATTERNS.iter() {
        result = pattern.replace_all(&result, "[FILTERED]").into_owned();
    }
    result
}

/// Truncate to at most `max_chars` characters, cutting back to the last
/// whitespace when there is one. Always splits on a char boundary.
fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    let cut = match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => byte_index,
        None => return text.to_string(),
    };
    let truncated = &text[..cut];
    match truncated.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => truncated[..pos].to_string(),
        _ => truncated.to_string(),
    }
}
