use crate::pipeline::types::{DiseaseCandidate, KnowledgeSnippet};

/// Candidates shown to the model.
const MAX_PROMPT_CANDIDATES: usize = 3;

/// Context block for the triage prompt plus what made it in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledContext {
    pub text: String,
    pub snippets_included: usize,
    pub candidates_included: usize,
}

/// Assemble retrieved evidence into labelled prompt sections.
///
/// Snippets go first, best score first, then graph candidates as one-line
/// annotations. A section is skipped whole when it would overflow
/// `budget_chars`.
pub fn assemble_context(
    snippets: &[KnowledgeSnippet],
    candidates: &[DiseaseCandidate],
    budget_chars: usize,
) -> AssembledContext {
    let mut sections: Vec<(&str, String)> = Vec::new();
    let mut total_chars = 0;
    let mut snippets_included = 0;
    let mut candidates_included = 0;

    let mut ranked: Vec<&KnowledgeSnippet> = snippets.iter().collect();
    ranked.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for snippet in ranked {
        let section = format!(
            "[{} | relevance {:.2}] {}",
            snippet.source_id, snippet.relevance_score, snippet.text
        );
        let len = section.chars().count();
        if total_chars + len <= budget_chars {
            total_chars += len;
            sections.push(("REFERENCE", section));
            snippets_included += 1;
        }
    }

    if !candidates.is_empty() && total_chars < budget_chars {
        let lines: Vec<String> = candidates
            .iter()
            .take(MAX_PROMPT_CANDIDATES)
            .map(format_candidate)
            .collect();
        let section = lines.join("\n");
        let len = section.chars().count();
        if total_chars + len <= budget_chars {
            candidates_included = lines.len();
            sections.push(("GRAPH CANDIDATES", section));
        }
    }

    let text = sections
        .iter()
        .map(|(label, content)| format!("<{label}>\n{content}\n</{label}>"))
        .collect::<Vec<_>>()
        .join("\n\n");

    AssembledContext {
        text,
        snippets_included,
        candidates_included,
    }
}

fn format_candidate(candidate: &DiseaseCandidate) -> String {
    format!(
        "- {} (confidence {:.2}, {} matched symptom(s), suggested urgency {})",
        candidate.disease_name,
        candidate.aggregated_confidence,
        candidate.matched_symptom_count,
        candidate.derived_urgency
    )
}
