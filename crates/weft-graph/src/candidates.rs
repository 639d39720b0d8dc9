//! Candidate edge and pseudo-node builders.
//!
//! These produce the raw edge streams the merge engine consumes: explicit
//! author links, direct tag-coincidence edges between notes, and membership
//! edges from notes to their tag pseudo-nodes.

use std::collections::{BTreeMap, BTreeSet};

use weft_core::text::{collapse_ws, normalize_tag};
use weft_core::{
    defaults, note_url, tag_node_id, CandidateConnection, Evidence, EvidenceSet, GraphNode, Note,
};

/// Reason recorded on explicit edges; also the forward direction marker.
pub const EXPLICIT_EDGE_REASON: &str = "ref: links to";

/// Build graph nodes for the notes themselves.
pub fn build_note_nodes(notes: &[Note]) -> Vec<GraphNode> {
    let mut seen = BTreeSet::new();
    let mut nodes = Vec::new();
    for note in notes {
        let id = note.id.to_string();
        if !seen.insert(id.clone()) {
            continue;
        }
        let title = collapse_ws(&note.title);
        nodes.push(GraphNode {
            id,
            title: if title.is_empty() {
                "Untitled".to_string()
            } else {
                title
            },
            kind: note.kind.as_str().to_string(),
            url: note_url(&note.id),
            tags: note
                .tags
                .iter()
                .take(defaults::NODE_TAGS_EXPORT_LIMIT)
                .cloned()
                .collect(),
            projects: note.projects.iter().map(|p| collapse_ws(p)).collect(),
            project_ids: note.project_ids.clone(),
        });
    }
    nodes
}

/// Build one pseudo-node per unique tag name across the exported notes,
/// sorted by name.
pub fn build_tag_nodes(notes: &[Note]) -> Vec<GraphNode> {
    let mut names = BTreeSet::new();
    for note in notes {
        for tag in note.tags.iter().take(defaults::NODE_TAGS_EXPORT_LIMIT) {
            let name = tag.name.trim();
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }
    }

    names
        .into_iter()
        .map(|name| GraphNode {
            id: tag_node_id(&name),
            title: format!("tag::{}", name),
            kind: "tag".to_string(),
            url: String::new(),
            tags: vec![],
            projects: vec![],
            project_ids: vec![],
        })
        .collect()
}

/// Explicit edges from author links. Self-references are skipped.
pub fn build_explicit_edges(notes: &[Note]) -> Vec<CandidateConnection> {
    let mut edges = Vec::new();
    for note in notes {
        let src = note.id.to_string();
        for target in &note.mentions {
            let dst = target.to_string();
            if src == dst {
                continue;
            }
            edges.push(CandidateConnection {
                source: src.clone(),
                target: dst,
                evidence: EvidenceSet::only(Evidence::Explicit),
                similarity: Some(100),
                score: Some(1.0),
                reason: EXPLICIT_EDGE_REASON.to_string(),
                via_tags: vec![],
                dashes: false,
            });
        }
    }
    edges
}

/// Inferred note-to-note edges for every pair sharing at least
/// `min_shared` tags. `via_tags` records the literal shared names; the
/// merge engine folds duplicates produced by multi-tag pairs.
pub fn build_tag_edges(notes: &[Note], min_shared: usize) -> Vec<CandidateConnection> {
    // Normalized tag -> note ids carrying it, and note id -> literal names.
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut literal: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for note in notes {
        let id = note.id.to_string();
        for tag in &note.tags {
            let name = tag.name.trim();
            if name.is_empty() {
                continue;
            }
            literal
                .entry(id.clone())
                .or_default()
                .insert(name.to_string());
            groups
                .entry(normalize_tag(name))
                .or_default()
                .insert(id.clone());
        }
    }

    let empty = BTreeSet::new();
    let mut edges = Vec::new();
    for ids in groups.values() {
        if ids.len() < 2 {
            continue;
        }
        let ids: Vec<&String> = ids.iter().collect();
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let (a, b) = (ids[i], ids[j]);
                let tags_a = literal.get(a).unwrap_or(&empty);
                let tags_b = literal.get(b).unwrap_or(&empty);
                let shared: Vec<String> = tags_a.intersection(tags_b).cloned().collect();
                if shared.len() < min_shared {
                    continue;
                }
                let shown: Vec<&str> = shared.iter().take(2).map(String::as_str).collect();
                edges.push(CandidateConnection {
                    source: a.clone(),
                    target: b.clone(),
                    evidence: EvidenceSet::only(Evidence::TagsInferred),
                    similarity: Some(99),
                    score: Some(0.99),
                    reason: format!("common tags: {}", shown.join(", ")),
                    via_tags: shared,
                    dashes: false,
                });
            }
        }
    }
    edges
}

/// Membership edges from each note to its tag pseudo-nodes.
pub fn build_tag_membership_edges(notes: &[Note]) -> Vec<CandidateConnection> {
    let mut edges = Vec::new();
    for note in notes {
        let src = note.id.to_string();
        for tag in note.tags.iter().take(defaults::NODE_TAGS_EXPORT_LIMIT) {
            let name = tag.name.trim();
            if name.is_empty() {
                continue;
            }
            edges.push(CandidateConnection {
                source: src.clone(),
                target: tag_node_id(name),
                evidence: EvidenceSet::only(Evidence::TagMembership),
                similarity: Some(100),
                score: Some(1.0),
                reason: format!("tagged with: {}", name),
                via_tags: vec![],
                dashes: false,
            });
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{NoteKind, Tag};

    const ID_A: &str = "11111111-1111-1111-1111-111111111111";
    const ID_B: &str = "22222222-2222-2222-2222-222222222222";
    const ID_C: &str = "33333333-3333-3333-3333-333333333333";

    fn note(id: &str, tags: &[&str], mentions: &[&str]) -> Note {
        Note {
            id: id.parse().unwrap(),
            title: format!("Note {}", &id[..2]),
            kind: NoteKind::Permanent,
            tags: tags.iter().map(|t| Tag::new(*t)).collect(),
            projects: vec![],
            project_ids: vec![],
            content: String::new(),
            mentions: mentions.iter().map(|m| m.parse().unwrap()).collect(),
        }
    }

    #[test]
    fn test_explicit_edges_skip_self_reference() {
        let notes = [note(ID_A, &[], &[ID_B, ID_A])];
        let edges = build_explicit_edges(&notes);

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, ID_B);
        assert_eq!(edges[0].similarity, Some(100));
        assert!(edges[0].evidence.is_only(Evidence::Explicit));
    }

    #[test]
    fn test_tag_edges_require_shared_tag() {
        let notes = [
            note(ID_A, &["rust", "graphs"], &[]),
            note(ID_B, &["rust"], &[]),
            note(ID_C, &["cooking"], &[]),
        ];
        let edges = build_tag_edges(&notes, 1);

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, ID_A);
        assert_eq!(edges[0].target, ID_B);
        assert_eq!(edges[0].via_tags, vec!["rust".to_string()]);
        assert_eq!(edges[0].similarity, Some(99));
        assert!(edges[0].reason.contains("rust"));
    }

    #[test]
    fn test_tag_edges_accent_insensitive_grouping() {
        let notes = [note(ID_A, &["Ètica"], &[]), note(ID_B, &["etica"], &[])];
        let edges = build_tag_edges(&notes, 1);
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn test_tag_nodes_unique_and_sorted() {
        let notes = [
            note(ID_A, &["zebra", "alpha"], &[]),
            note(ID_B, &["alpha"], &[]),
        ];
        let nodes = build_tag_nodes(&notes);

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, "tag::alpha");
        assert_eq!(nodes[0].kind, "tag");
        assert_eq!(nodes[1].id, "tag::zebra");
        assert!(nodes[0].url.is_empty());
    }

    #[test]
    fn test_membership_edges_point_at_tag_nodes() {
        let notes = [note(ID_A, &["Deep Work"], &[])];
        let edges = build_tag_membership_edges(&notes);

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, "tag::deep-work");
        assert!(edges[0].evidence.is_only(Evidence::TagMembership));
        assert_eq!(edges[0].reason, "tagged with: Deep Work");
    }

    #[test]
    fn test_note_nodes_dedup_and_untitled_fallback() {
        let mut untitled = note(ID_A, &[], &[]);
        untitled.title = "  ".to_string();
        let notes = [untitled.clone(), untitled];
        let nodes = build_note_nodes(&notes);

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].title, "Untitled");
        assert!(nodes[0].url.contains("11111111"));
    }
}
