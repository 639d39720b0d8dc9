//! Prompt construction for the connection-scoring call.
//!
//! The service is instructed to return strictly formatted JSON referencing
//! only the UUIDs shown in the candidate headers. Malformed replies are
//! expected anyway; the parser absorbs them.

use weft_core::{defaults, Note};

/// Knobs for the connection prompt.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Similarity floor the model is told to apply.
    pub min_similarity: u8,
    /// Language the reasons should be written in.
    pub language: String,
    /// Candidates listed in one prompt.
    pub max_candidates: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            min_similarity: defaults::AI_MIN_SIMILARITY,
            language: "English".to_string(),
            max_candidates: defaults::PROMPT_MAX_CANDIDATES,
        }
    }
}

fn preview(content: &str, limit: usize) -> String {
    content.chars().take(limit).collect()
}

fn tag_list(note: &Note, limit: usize) -> String {
    let names: Vec<&str> = note.tag_names().take(limit).collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// Build the scoring prompt for one source note against its candidates.
pub fn build_connection_prompt(note: &Note, candidates: &[&Note], config: &PromptConfig) -> String {
    let mut context_lines = Vec::new();
    for (i, cand) in candidates.iter().take(config.max_candidates).enumerate() {
        context_lines.push(format!(
            "{}. [{}] {}\n   Tags: {}\n   Preview: {}...",
            i + 1,
            cand.id,
            cand.title,
            tag_list(cand, defaults::PROMPT_CANDIDATE_TAGS),
            preview(&cand.content, defaults::PROMPT_CANDIDATE_PREVIEW)
        ));
    }
    let context = context_lines.join("\n");

    format!(
        r#"You are a JSON-only responder.

Return raw JSON ONLY. Do NOT include code fences, backticks, or any text before/after.

TASK:
Given a SOURCE NOTE and several CANDIDATE NOTES (each candidate shows its title and [UUID] in brackets),
return conceptual connections from the source note to candidates.

OUTPUT FORMAT (array only):
[
  {{ "id": "<UUID exactly as shown in brackets>", "similarity": 0-100, "reason": "<brief explanation>" }}
]

CONSTRAINTS:
- Use ONLY UUIDs appearing in the CANDIDATE NOTES headers (the text between [ and ]).
- similarity MUST be an integer 0-100 (no percentages, no floats).
- Include ONLY entries with similarity >= {min_sim}.
- If there are NO connections >= {min_sim}, return exactly: []
- Reason MUST be 3-20 words, concrete and human-readable. Avoid single-word labels.
- Write reasons in {language} and mention 1-2 specific overlapping concepts/tags.
- If any reason would be shorter than 3 words, DO NOT include that entry.

SOURCE NOTE:
Title: {title}
Tags: {tags}
Content preview: {content}...

CANDIDATE NOTES (use the ID in brackets):
{context}"#,
        min_sim = config.min_similarity,
        language = config.language,
        title = note.title,
        tags = tag_list(note, defaults::PROMPT_SOURCE_TAGS),
        content = preview(&note.content, defaults::PROMPT_SOURCE_PREVIEW),
        context = context,
    )
}
