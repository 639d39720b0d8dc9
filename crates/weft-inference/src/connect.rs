//! AI connection orchestration.
//!
//! Drives one scoring call per source note: builds the prompt, invokes the
//! backend with retries and exponential backoff on transport failures,
//! hands the reply to the parser, and applies the acceptance filters.
//! Failures degrade to an empty result; the pipeline never aborts because
//! the scoring service misbehaved.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use weft_core::{defaults, GenerationBackend, Note, RunContext};

use crate::parser::{ParsedConnection, ResponseParser};
use crate::prompt::{build_connection_prompt, PromptConfig};

/// Orchestrator knobs.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Acceptance floor for AI-suggested similarities.
    pub min_similarity: u8,
    /// Extra attempts after the first failed call.
    pub retries: u32,
    /// Exponential backoff base between retries (seconds).
    pub backoff: f64,
    /// Fixed delay before each AI call (ms), for external rate limits.
    pub call_delay_ms: u64,
    /// Language the reasons should be written in.
    pub language: String,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            min_similarity: defaults::AI_MIN_SIMILARITY,
            retries: defaults::AI_RETRIES,
            backoff: defaults::AI_BACKOFF,
            call_delay_ms: defaults::AI_CALL_DELAY_MS,
            language: "English".to_string(),
        }
    }
}

/// Analyze one note against its candidates through the AI scoring service.
///
/// `exclude` holds candidate ids already connected through other signals;
/// they are not re-sent. Always returns a list (possibly empty), never an
/// error.
pub async fn analyze_connections(
    backend: &dyn GenerationBackend,
    ctx: &RunContext,
    note: &Note,
    candidates: &[&Note],
    exclude: &HashSet<Uuid>,
    config: &ConnectConfig,
) -> Vec<ParsedConnection> {
    let pending: Vec<&Note> = candidates
        .iter()
        .copied()
        .filter(|c| !exclude.contains(&c.id))
        .collect();
    if pending.is_empty() {
        return Vec::new();
    }

    sleep(Duration::from_millis(config.call_delay_ms)).await;

    let parser = ResponseParser::new(&pending, ctx, config.min_similarity);
    let prompt_config = PromptConfig {
        min_similarity: config.min_similarity,
        language: config.language.clone(),
        max_candidates: defaults::PROMPT_MAX_CANDIDATES,
    };
    let prompt = build_connection_prompt(note, &pending, &prompt_config);

    debug!(
        note_id = %note.id,
        prompt_len = prompt.len(),
        candidates = pending.len(),
        "Requesting AI connections"
    );

    let mut last_err = None;
    for attempt in 0..=config.retries {
        match backend.generate(&prompt).await {
            Ok(response) => {
                let response = response.trim();
                debug!(
                    note_id = %note.id,
                    response_len = response.len(),
                    attempt = attempt + 1,
                    "AI reply received"
                );

                let (accepted, _stats) = parser.parse_strict(response);
                if !accepted.is_empty() {
                    info!(
                        note_id = %note.id,
                        result_count = accepted.len(),
                        "Valid AI connections found"
                    );
                    return accepted;
                }

                // Secondary best-effort pass, re-filtered with the same
                // acceptance rules the strict pass applies.
                let relaxed: Vec<ParsedConnection> = parser
                    .parse_relaxed(response)
                    .into_iter()
                    .filter(|c| c.similarity >= config.min_similarity && ctx.reason_ok(&c.reason))
                    .collect();
                if !relaxed.is_empty() {
                    info!(
                        note_id = %note.id,
                        result_count = relaxed.len(),
                        "Valid AI connections found (fallback parse)"
                    );
                    return relaxed;
                }

                warn!(
                    note_id = %note.id,
                    attempt = attempt + 1,
                    attempts_total = config.retries + 1,
                    preview = %response.chars().take(200).collect::<String>().replace('\n', " "),
                    "AI returned no valid connections"
                );
            }
            Err(e) if e.is_retryable() && attempt < config.retries => {
                let backoff = config.backoff.powi(attempt as i32);
                warn!(
                    note_id = %note.id,
                    attempt = attempt + 1,
                    attempts_total = config.retries + 1,
                    error = %e,
                    backoff_secs = backoff,
                    "AI call failed; retrying"
                );
                last_err = Some(e);
                sleep(Duration::from_secs_f64(backoff)).await;
            }
            Err(e) => {
                error!(
                    note_id = %note.id,
                    attempt = attempt + 1,
                    error = %e,
                    "AI call failed; giving up"
                );
                last_err = Some(e);
                break;
            }
        }
    }

    if let Some(e) = last_err {
        error!(note_id = %note.id, error = %e, "Skipping AI connections after repeated failures");
    } else {
        info!(
            note_id = %note.id,
            attempts = config.retries + 1,
            "AI returned no valid connections after all attempts"
        );
    }
    Vec::new()
}
