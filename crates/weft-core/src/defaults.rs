//! Centralized default constants for the weft pipeline.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// TAG SIMILARITY SCORING
// =============================================================================

/// Points awarded per shared (normalized) tag between two notes.
pub const TAG_POINTS_PER_COMMON_TAG: u32 = 25;

/// Cap on the score contribution from shared tags.
pub const TAG_MAX_POINTS_FROM_TAGS: u32 = 50;

/// Minimum length for a content keyword to count toward overlap.
pub const KEYWORD_MIN_LEN: usize = 5;

/// Points per unit of keyword multiset-overlap frequency.
pub const KEYWORD_POINTS_PER_OVERLAP: u32 = 3;

/// Cap on the score contribution from keyword overlap.
pub const KEYWORD_MAX_POINTS: u32 = 50;

/// Tag-based scores are clamped here; 100 is reserved for explicit links.
pub const TAG_SCORE_CEILING: u8 = 99;

/// Minimum tag-based score for a candidate to be kept at all.
/// 20 keeps any single-tag match (25 points) while dropping keyword-only
/// noise below 7 overlap units.
pub const TAGS_MIN_SCORE_KEEP: u8 = 20;

// =============================================================================
// REASON QUALITY
// =============================================================================

/// Minimum total word count for an acceptable connection reason.
pub const MIN_REASON_WORDS: usize = 8;

/// Maximum total word count for an acceptable connection reason.
pub const MAX_REASON_WORDS: usize = 20;

/// Minimum number of content words (length >= 3, not a stopword).
pub const MIN_CONTENT_WORDS: usize = 5;

// =============================================================================
// AI SCORING SERVICE
// =============================================================================

/// Minimum similarity (0-100) for an AI-suggested connection to be accepted.
pub const AI_MIN_SIMILARITY: u8 = 65;

/// Timeout for one AI generation request (seconds).
pub const AI_TIMEOUT_SECS: u64 = 180;

/// Extra attempts after the first failed AI call.
pub const AI_RETRIES: u32 = 2;

/// Exponential backoff base between AI retries (seconds).
pub const AI_BACKOFF: f64 = 1.5;

/// Token budget for one AI reply.
pub const AI_MAX_TOKENS: u32 = 1000;

/// Sampling temperature; low because the reply must be machine-parseable.
pub const AI_TEMPERATURE: f64 = 0.2;

/// Timeout for the availability ping (seconds; generous for cold starts).
pub const AI_AVAILABILITY_TIMEOUT_SECS: u64 = 30;

/// Fixed delay before each AI call, to respect external rate limits (ms).
pub const AI_CALL_DELAY_MS: u64 = 500;

// =============================================================================
// PROMPT CONSTRUCTION
// =============================================================================

/// Maximum candidate notes listed in one prompt.
pub const PROMPT_MAX_CANDIDATES: usize = 10;

/// Content preview length for the source note (chars).
pub const PROMPT_SOURCE_PREVIEW: usize = 300;

/// Content preview length per candidate note (chars).
pub const PROMPT_CANDIDATE_PREVIEW: usize = 100;

/// Tags shown per candidate note.
pub const PROMPT_CANDIDATE_TAGS: usize = 3;

/// Tags shown for the source note.
pub const PROMPT_SOURCE_TAGS: usize = 10;

// =============================================================================
// PIPELINE
// =============================================================================

/// Tag-based candidates retained per note.
pub const TAG_CANDIDATES_PER_NOTE: usize = 5;

/// AI-accepted candidates retained per note.
pub const AI_CANDIDATES_PER_NOTE: usize = 3;

/// Delay between per-note analysis rounds (ms).
pub const NOTE_DELAY_MS: u64 = 250;

/// Tags exported per graph node.
pub const NODE_TAGS_EXPORT_LIMIT: usize = 8;

// =============================================================================
// PRUNING / VALIDATION
// =============================================================================

/// Minimum similarity kept by the merge engine's pruning pass.
pub const MIN_SIMILARITY_KEPT: u8 = 60;

/// Top-K edges retained per node (0 disables the cap).
pub const TOPK_PER_NODE: usize = 3;

/// Default minimum similarity for the standalone validator CLI.
pub const VALIDATE_MIN_SIM: u8 = 55;

// =============================================================================
// EXTERNAL LINKS
// =============================================================================

/// Base URL for note backlinks in the persisted graph.
pub const NOTE_URL_BASE: &str = "https://www.notion.so/";
