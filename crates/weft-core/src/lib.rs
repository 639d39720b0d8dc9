//! # weft-core
//!
//! Core types, traits, and text utilities for the weft connection-graph
//! pipeline.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the other weft crates depend on.

pub mod context;
pub mod defaults;
pub mod error;
pub mod evidence;
pub mod ids;
pub mod logging;
pub mod models;
pub mod score;
pub mod stopwords;
pub mod text;
pub mod traits;

// Re-export commonly used types at crate root
pub use context::{ReasonPolicy, RunContext};
pub use error::{Error, Result};
pub use evidence::{Evidence, EvidenceSet};
pub use ids::{is_valid_node_id, normalize_uuid, tag_node_id, TAG_NODE_PREFIX};
pub use models::{
    note_url, CandidateConnection, ConnectionMethod, Graph, GraphMeta, GraphNode, MergedEdge, Note,
    NoteKind, Suggestion, Tag,
};
pub use score::{coerce_similarity, score_from_similarity, similarity_from_score};
pub use stopwords::Stopwords;
pub use traits::GenerationBackend;
