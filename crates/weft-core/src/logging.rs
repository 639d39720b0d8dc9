//! Structured logging field name constants for weft.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Persistence failures, exhausted AI retries |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, per-phase completions, final counts |
//! | DEBUG | Decision points, parser strategy choices, skip reasons |
//! | TRACE | Per-item iteration (per-candidate scoring, raw responses) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Component within the pipeline.
/// Examples: "scorer", "parser", "connect", "merge", "validate", "persist"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "analyze_tags", "analyze_ai", "merge_edges", "save_graph"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by an analysis or parse.
pub const RESULT_COUNT: &str = "result_count";

/// Retry attempt number (1-indexed).
pub const ATTEMPT: &str = "attempt";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Graph fields ──────────────────────────────────────────────────────────

/// Number of nodes in a graph.
pub const NODE_COUNT: &str = "node_count";

/// Number of edges in a graph.
pub const EDGE_COUNT: &str = "edge_count";
