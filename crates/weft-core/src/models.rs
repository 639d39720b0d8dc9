//! Data model for notes, candidate connections, and the persisted graph.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;
use crate::evidence::EvidenceSet;

/// A tag as authored upstream: display name plus display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default = "default_tag_color")]
    pub color: String,
}

fn default_tag_color() -> String {
    "default".to_string()
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: default_tag_color(),
        }
    }
}

/// The note categories the pipeline analyzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// Evergreen idea note; analyzed against other permanent notes.
    Permanent,
    /// Literature/reading note; analyzed against permanent and reading notes.
    Reading,
    /// Structure note; included as a graph node but not analyzed.
    Index,
}

impl NoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Permanent => "permanent",
            NoteKind::Reading => "reading",
            NoteKind::Index => "index",
        }
    }
}

impl std::fmt::Display for NoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A knowledge-base note, as supplied by the upstream note source.
/// Immutable for the duration of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub kind: NoteKind,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub project_ids: Vec<String>,
    #[serde(default)]
    pub content: String,
    /// Note ids the author linked to from this note's body.
    #[serde(default)]
    pub mentions: Vec<Uuid>,
}

impl Note {
    /// Iterator over this note's tag names.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.name.as_str())
    }
}

/// How a suggested connection was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMethod {
    /// Tag/keyword overlap scoring.
    Tags,
    /// Accepted AI judgment.
    Ai,
    /// Low-confidence AI fallback (UUID or title spotted in raw text).
    AiFallback,
}

/// One raw candidate edge, before merging. Produced by the scorer, the
/// orchestrator, and the tag-edge builders; consumed by the merge engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateConnection {
    pub source: String,
    pub target: String,
    pub evidence: EvidenceSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default)]
    pub reason: String,
    /// Literal shared tag names, when the edge came from tag coincidence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub via_tags: Vec<String>,
    /// Legacy hint: edge was drawn dashed (AI-inferred) by an older producer.
    #[serde(default)]
    pub dashes: bool,
}

/// A graph node: a real note or a tag pseudo-node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub title: String,
    /// "permanent" | "reading" | "index" | "tag" | "" when unknown.
    pub kind: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub project_ids: Vec<String>,
}

/// A merged, undirected edge in the final graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedEdge {
    pub source: String,
    pub target: String,
    pub evidence: EvidenceSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub tags_overlap: Vec<String>,
    #[serde(default)]
    pub project_overlap: Vec<String>,
    #[serde(default)]
    pub directed: bool,
    /// "undirected" | "source_to_target" | "target_to_source".
    #[serde(default = "default_direction_info")]
    pub direction_info: String,
    /// "end" when the edge is directed; rendering hint only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrow: Option<String>,
    /// Drawn dashed iff the evidence is exactly {ai}.
    #[serde(default)]
    pub dashes: bool,
}

fn default_direction_info() -> String {
    "undirected".to_string()
}

/// Generation metadata recorded alongside the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphMeta {
    pub nodes: usize,
    pub edges: usize,
    pub generated_at: String,
    pub min_similarity_kept: u8,
    pub topk_per_node: usize,
}

/// The durable artifact: nodes plus merged edges plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<MergedEdge>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<GraphMeta>,
}

impl Graph {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<MergedEdge>) -> Self {
        Self {
            nodes,
            edges,
            meta: None,
        }
    }
}

/// One consolidated suggestion for a source note, viewer-format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub target_id: String,
    /// 0-1, rounded to 4 decimals.
    pub score: f32,
    /// 0-99; 100 is reserved for explicit links.
    pub similarity: u8,
    pub reason: String,
    pub method: ConnectionMethod,
}

/// Backlink URL for a note in the upstream service.
pub fn note_url(id: &Uuid) -> String {
    format!("{}{}", defaults::NOTE_URL_BASE, id.simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_color_defaults_on_deserialize() {
        let tag: Tag = serde_json::from_str(r#"{"name": "ethics"}"#).unwrap();
        assert_eq!(tag.color, "default");
    }

    #[test]
    fn test_note_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&NoteKind::Permanent).unwrap(),
            r#""permanent""#
        );
    }

    #[test]
    fn test_note_url_strips_dashes() {
        let id: Uuid = "11111111-2222-3333-4444-555555555555".parse().unwrap();
        assert_eq!(
            note_url(&id),
            "https://www.notion.so/11111111222233334444555555555555"
        );
    }

    #[test]
    fn test_graph_meta_renamed() {
        let mut graph = Graph::new(vec![], vec![]);
        graph.meta = Some(GraphMeta {
            nodes: 0,
            edges: 0,
            generated_at: "2026-01-01 00:00:00".into(),
            min_similarity_kept: 60,
            topk_per_node: 3,
        });
        let json = serde_json::to_value(&graph).unwrap();
        assert!(json.get("_meta").is_some());
    }

    #[test]
    fn test_edge_optional_fields_omitted() {
        let edge = MergedEdge {
            source: "a".into(),
            target: "b".into(),
            evidence: EvidenceSet::new(),
            similarity: None,
            score: None,
            reasons: vec![],
            tags_overlap: vec![],
            project_overlap: vec![],
            directed: false,
            direction_info: "undirected".into(),
            arrow: None,
            dashes: false,
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert!(json.get("similarity").is_none());
        assert!(json.get("arrow").is_none());
    }
}
