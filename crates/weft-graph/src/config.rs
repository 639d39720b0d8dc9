//! Pipeline configuration.
//!
//! Every knob has a compiled default (see `weft_core::defaults`) and can be
//! overridden from `WEFT_*` environment variables.

use std::path::PathBuf;

use weft_core::{defaults, ReasonPolicy};
use weft_inference::ConnectConfig;

use crate::scorer::ScoreWeights;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Tag/keyword scoring weights.
    pub weights: ScoreWeights,
    /// Minimum tag-based score for a candidate to be kept.
    pub tags_min_score_keep: u8,
    /// Tag-based candidates retained per note.
    pub tag_candidates_per_note: usize,
    /// AI acceptances retained per note.
    pub ai_candidates_per_note: usize,
    /// Delay between per-note analysis rounds (ms).
    pub note_delay_ms: u64,
    /// Similarity floor for the final pruning pass.
    pub min_similarity_kept: u8,
    /// Top-K edges per node for the final pruning pass (0 disables).
    pub topk_per_node: usize,
    /// Orchestrator knobs (retries, backoff, AI acceptance floor).
    pub connect: ConnectConfig,
    /// Reason-quality bounds.
    pub reason_policy: ReasonPolicy,
    /// Explicit stopword file, ahead of the default probe paths.
    pub stopwords_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            tags_min_score_keep: defaults::TAGS_MIN_SCORE_KEEP,
            tag_candidates_per_note: defaults::TAG_CANDIDATES_PER_NOTE,
            ai_candidates_per_note: defaults::AI_CANDIDATES_PER_NOTE,
            note_delay_ms: defaults::NOTE_DELAY_MS,
            min_similarity_kept: defaults::MIN_SIMILARITY_KEPT,
            topk_per_node: defaults::TOPK_PER_NODE,
            connect: ConnectConfig::default(),
            reason_policy: ReasonPolicy::default(),
            stopwords_path: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PipelineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `WEFT_TAGS_MIN_SCORE_KEEP` | 20 | Tag-score keep threshold |
    /// | `WEFT_TAG_CANDIDATES` | 5 | Tag candidates per note |
    /// | `WEFT_AI_CANDIDATES` | 3 | AI acceptances per note |
    /// | `WEFT_NOTE_DELAY_MS` | 250 | Delay between notes |
    /// | `WEFT_MIN_SIMILARITY_KEPT` | 60 | Pruning similarity floor |
    /// | `WEFT_TOPK_PER_NODE` | 3 | Top-K per node (0 disables) |
    /// | `WEFT_AI_MIN_SIM` | 65 | AI acceptance floor |
    /// | `WEFT_AI_RETRIES` | 2 | Extra AI attempts |
    /// | `WEFT_AI_BACKOFF` | 1.5 | Backoff base (seconds) |
    /// | `WEFT_AI_CALL_DELAY_MS` | 500 | Delay before each AI call |
    /// | `WEFT_REASON_LANGUAGE` | English | Language for AI reasons |
    /// | `WEFT_MIN_REASON_WORDS` | 8 | Reason word floor |
    /// | `WEFT_MAX_REASON_WORDS` | 20 | Reason word ceiling |
    /// | `WEFT_MIN_CONTENT_WORDS` | 5 | Content-word floor |
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            tags_min_score_keep: env_parse("WEFT_TAGS_MIN_SCORE_KEEP", base.tags_min_score_keep),
            tag_candidates_per_note: env_parse("WEFT_TAG_CANDIDATES", base.tag_candidates_per_note),
            ai_candidates_per_note: env_parse("WEFT_AI_CANDIDATES", base.ai_candidates_per_note),
            note_delay_ms: env_parse("WEFT_NOTE_DELAY_MS", base.note_delay_ms),
            min_similarity_kept: env_parse("WEFT_MIN_SIMILARITY_KEPT", base.min_similarity_kept),
            topk_per_node: env_parse("WEFT_TOPK_PER_NODE", base.topk_per_node),
            connect: ConnectConfig {
                min_similarity: env_parse("WEFT_AI_MIN_SIM", base.connect.min_similarity),
                retries: env_parse("WEFT_AI_RETRIES", base.connect.retries),
                backoff: env_parse("WEFT_AI_BACKOFF", base.connect.backoff),
                call_delay_ms: env_parse("WEFT_AI_CALL_DELAY_MS", base.connect.call_delay_ms),
                language: std::env::var("WEFT_REASON_LANGUAGE")
                    .unwrap_or_else(|_| base.connect.language.clone()),
            },
            reason_policy: ReasonPolicy {
                min_reason_words: env_parse(
                    "WEFT_MIN_REASON_WORDS",
                    base.reason_policy.min_reason_words,
                ),
                max_reason_words: env_parse(
                    "WEFT_MAX_REASON_WORDS",
                    base.reason_policy.max_reason_words,
                ),
                min_content_words: env_parse(
                    "WEFT_MIN_CONTENT_WORDS",
                    base.reason_policy.min_content_words,
                ),
            },
            ..base
        }
    }
}
