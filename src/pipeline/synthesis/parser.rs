use serde_json::{Map, Value};

use super::SynthesisFailure;
use crate::pipeline::types::{Provenance, TriageResult, UrgencyTier};

/// Parse a triage completion into a [`TriageResult`].
///
/// The response must be a single JSON object, optionally inside a fenced
/// block, with `urgency_level`, `confidence`, `advice` and
/// `detected_symptoms`. Confidence is clamped into [0, 1].
pub fn parse_triage_response(response: &str) -> Result<TriageResult, SynthesisFailure> {
    let body = extract_json_body(response)?;
    let value: Value =
        serde_json::from_str(body).map_err(|e| SynthesisFailure::MalformedJson(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| SynthesisFailure::MalformedJson("Top-level value is not an object".into()))?;

    let urgency_label = required(object, "urgency_level")?
        .as_str()
        .ok_or_else(|| invalid("urgency_level", "expected a string"))?;
    let urgency = UrgencyTier::canonicalize(urgency_label)
        .ok_or_else(|| SynthesisFailure::UnknownUrgency(urgency_label.to_string()))?;

    let confidence = required(object, "confidence")?
        .as_f64()
        .ok_or_else(|| invalid("confidence", "expected a number"))? as f32;

    let advice = required(object, "advice")?
        .as_str()
        .ok_or_else(|| invalid("advice", "expected a string"))?
        .trim();
    if advice.is_empty() {
        return Err(invalid("advice", "must not be empty"));
    }

    let detected_symptoms = required(object, "detected_symptoms")?
        .as_array()
        .ok_or_else(|| invalid("detected_symptoms", "expected an array"))?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();

    Ok(TriageResult::new(
        urgency,
        confidence,
        advice,
        detected_symptoms,
        Provenance::Generative,
    ))
}

/// Trimmed response, or the content of its first fenced block with any
/// leading `json` language tag removed.
fn extract_json_body(response: &str) -> Result<&str, SynthesisFailure> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(SynthesisFailure::EmptyResponse);
    }

    let Some(open) = trimmed.find("```") else {
        return Ok(trimmed);
    };
    let after_open = &trimmed[open + 3..];
    let inner = match after_open.find("```") {
        Some(close) => &after_open[..close],
        None => after_open,
    };

    let inner = inner.trim_start();
    let inner = match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    };

    let inner = inner.trim();
    if inner.is_empty() {
        return Err(SynthesisFailure::EmptyResponse);
    }
    Ok(inner)
}

fn required<'a>(object: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, SynthesisFailure> {
    match object.get(field) {
        Some(Value::Null) | None => Err(SynthesisFailure::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn invalid(field: &'static str, reason: &str) -> SynthesisFailure {
    SynthesisFailure::InvalidField {
        field,
        reason: reason.to_string(),
    }
}
