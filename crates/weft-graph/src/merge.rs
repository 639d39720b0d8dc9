//! Edge merge & validation engine.
//!
//! Consumes every raw candidate edge for the run and produces one merged,
//! undirected edge per unordered endpoint pair: evidence unioned,
//! similarity maxed, reasons accumulated, weak AI-only reasons backfilled
//! from tag/project overlap or the edge dropped. Pruning (similarity floor
//! and per-node top-K) runs once, globally, after all merging.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use weft_core::text::{collapse_ws, normalize_tagset};
use weft_core::{
    CandidateConnection, Evidence, EvidenceSet, GraphNode, MergedEdge, RunContext,
};

use crate::candidates::EXPLICIT_EDGE_REASON;

/// Reason given to explicit edges that arrive with none.
pub const DEFAULT_EXPLICIT_REASON: &str = "Explicit link between the two notes";

/// Reason substrings indicating a source-to-target direction.
const FORWARD_MARKERS: &[&str] = &[EXPLICIT_EDGE_REASON];

/// Reason substrings indicating a target-to-source direction.
const BACKWARD_MARKERS: &[&str] = &["linked from", "referenced by"];

/// Unordered pair key: endpoints sorted so (a,b) and (b,a) collide.
fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

struct MergedRecord {
    source: String,
    target: String,
    evidence: EvidenceSet,
    reasons: Vec<String>,
    similarity: Option<u8>,
    score: Option<f32>,
    tags_overlap: BTreeSet<String>,
    project_overlap: BTreeSet<String>,
}

fn tags_overlap(a: &GraphNode, b: &GraphNode) -> BTreeSet<String> {
    let set_a = normalize_tagset(a.tags.iter().map(|t| t.name.as_str()));
    let set_b = normalize_tagset(b.tags.iter().map(|t| t.name.as_str()));
    set_a.intersection(&set_b).cloned().collect()
}

fn project_overlap(a: &GraphNode, b: &GraphNode) -> BTreeSet<String> {
    let fold = |list: &[String]| -> BTreeSet<String> {
        list.iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect()
    };
    fold(&a.projects)
        .intersection(&fold(&b.projects))
        .cloned()
        .collect()
}

/// Merge all raw candidate edges into one record per unordered pair.
///
/// Edges with an endpoint missing from `nodes` are skipped. AI-only edges
/// whose reason fails the quality check are backfilled from tag/project
/// overlap, and dropped entirely when the backfilled reason still fails.
pub fn merge_edges(
    nodes: &[GraphNode],
    raw: &[CandidateConnection],
    ctx: &RunContext,
) -> Vec<MergedEdge> {
    let id2node: HashMap<&str, &GraphNode> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut order: Vec<(String, String)> = Vec::new();
    let mut merged: HashMap<(String, String), MergedRecord> = HashMap::new();
    let mut dropped_weak = 0usize;
    let mut dropped_dangling = 0usize;

    for edge in raw {
        let (Some(node_s), Some(node_t)) = (
            id2node.get(edge.source.as_str()).copied(),
            id2node.get(edge.target.as_str()).copied(),
        ) else {
            dropped_dangling += 1;
            continue;
        };

        // Normalize evidence; a missing set is inferred from the legacy
        // dashes hint.
        let mut evidence = edge.evidence.clone();
        if evidence.is_empty() {
            evidence = EvidenceSet::only(if edge.dashes {
                Evidence::Ai
            } else {
                Evidence::Explicit
            });
        }
        if !edge.via_tags.is_empty() {
            evidence.insert(Evidence::Tags);
        }

        let mut reason = collapse_ws(&edge.reason);
        let overlap_tags = tags_overlap(node_s, node_t);
        let overlap_projects = project_overlap(node_s, node_t);

        // A purely AI-judged edge must justify itself. Try to back its weak
        // reason with objective overlap before giving up on the edge.
        if evidence.is_only(Evidence::Ai) && !ctx.reason_ok(&reason) {
            let mut extras = Vec::new();
            if !overlap_tags.is_empty() {
                let shown: Vec<&str> =
                    overlap_tags.iter().take(2).map(String::as_str).collect();
                extras.push(format!("common tags: {}", shown.join(", ")));
            }
            if !overlap_projects.is_empty() {
                let first = overlap_projects.iter().next().map(String::as_str).unwrap_or("");
                extras.push(format!("common projects: {}", first));
            }
            if !extras.is_empty() {
                reason = if reason.is_empty() {
                    extras.join("; ")
                } else {
                    format!("{} – {}", reason, extras.join("; "))
                };
            }
            if !ctx.reason_ok(&reason) {
                dropped_weak += 1;
                continue;
            }
        }

        let key = pair_key(&edge.source, &edge.target);
        match merged.entry(key) {
            Entry::Vacant(entry) => {
                // Purely explicit edges with no numeric value seed at 100.
                let similarity = edge.similarity.or_else(|| {
                    evidence.is_only(Evidence::Explicit).then_some(100)
                });
                order.push(entry.key().clone());
                entry.insert(MergedRecord {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    evidence,
                    reasons: if reason.is_empty() { vec![] } else { vec![reason] },
                    similarity,
                    score: edge.score,
                    tags_overlap: overlap_tags,
                    project_overlap: overlap_projects,
                });
            }
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                record.evidence.union_with(&evidence);
                if !reason.is_empty() {
                    record.reasons.push(reason);
                }

                // Running maximum; an explicit edge with no value counts
                // as 100.
                match edge.similarity {
                    Some(sim) => {
                        if record.similarity.map_or(true, |prev| sim > prev) {
                            record.similarity = Some(sim);
                        }
                    }
                    None if evidence.is_only(Evidence::Explicit) => {
                        if record.similarity.map_or(true, |prev| prev < 100) {
                            record.similarity = Some(100);
                        }
                    }
                    None => {}
                }

                if let Some(score) = edge.score {
                    if record.score.map_or(true, |prev| score > prev) {
                        record.score = Some(score);
                    }
                }

                record.tags_overlap.extend(overlap_tags);
                record.project_overlap.extend(overlap_projects);
            }
        }
    }

    let mut out = Vec::with_capacity(order.len());
    for key in order {
        let Some(record) = merged.remove(&key) else {
            continue;
        };

        // Unique reasons, first occurrence wins.
        let mut reasons: Vec<String> = Vec::new();
        for reason in record.reasons {
            let cleaned = collapse_ws(&reason);
            if !cleaned.is_empty() && !reasons.contains(&cleaned) {
                reasons.push(cleaned);
            }
        }
        if reasons.is_empty() && record.evidence.contains(Evidence::Explicit) {
            reasons.push(DEFAULT_EXPLICIT_REASON.to_string());
        }

        // Direction is only ever inferred for explicit evidence, from the
        // recorded reason markers.
        let (directed, direction_info) = if record.evidence.contains(Evidence::Explicit) {
            let lower: Vec<String> = reasons.iter().map(|r| r.to_lowercase()).collect();
            if lower
                .iter()
                .any(|r| FORWARD_MARKERS.iter().any(|m| r.contains(m)))
            {
                (true, "source_to_target")
            } else if lower
                .iter()
                .any(|r| BACKWARD_MARKERS.iter().any(|m| r.contains(m)))
            {
                (true, "target_to_source")
            } else {
                (false, "undirected")
            }
        } else {
            (false, "undirected")
        };

        let dashes = record.evidence.is_only(Evidence::Ai);
        out.push(MergedEdge {
            source: record.source,
            target: record.target,
            evidence: record.evidence,
            similarity: record.similarity,
            score: record.score,
            reasons,
            tags_overlap: record.tags_overlap.into_iter().collect(),
            project_overlap: record.project_overlap.into_iter().collect(),
            directed,
            direction_info: direction_info.to_string(),
            arrow: directed.then(|| "end".to_string()),
            dashes,
        });
    }

    let directed_count = out.iter().filter(|e| e.directed).count();
    info!(
        edge_count = out.len(),
        directed = directed_count,
        dropped_weak_reason = dropped_weak,
        dropped_dangling = dropped_dangling,
        "Edge merge complete"
    );
    out
}

/// Prune merged edges: similarity floor, then greedy per-node top-K.
///
/// Edges with no similarity (purely explicit) always pass the floor. The
/// top-K pass sorts by similarity descending (missing last) with a
/// deterministic endpoint tie-break, then keeps an edge while at least one
/// endpoint is still under the cap, incrementing both endpoint counters on
/// every keep, so a node can end up above K when its partners had spare
/// capacity, but the total stays bounded by K x node count.
pub fn prune_edges(
    edges: Vec<MergedEdge>,
    min_similarity: Option<u8>,
    topk_per_node: Option<usize>,
) -> Vec<MergedEdge> {
    let before = edges.len();

    let mut prelim: Vec<MergedEdge> = match min_similarity {
        Some(floor) => edges
            .into_iter()
            .filter(|e| e.similarity.map_or(true, |s| s >= floor))
            .collect(),
        None => edges,
    };

    let kept = match topk_per_node {
        None | Some(0) => prelim,
        Some(k) => {
            prelim.sort_by(|a, b| {
                let key_a = (a.similarity.map_or(-1, i32::from), &a.source, &a.target);
                let key_b = (b.similarity.map_or(-1, i32::from), &b.source, &b.target);
                key_b.cmp(&key_a)
            });

            let mut counts: HashMap<String, usize> = HashMap::new();
            let mut kept = Vec::new();
            for edge in prelim {
                let (a, b) = pair_key(&edge.source, &edge.target);
                let count_a = counts.get(&a).copied().unwrap_or(0);
                let count_b = counts.get(&b).copied().unwrap_or(0);
                if count_a < k || count_b < k {
                    *counts.entry(a).or_insert(0) += 1;
                    *counts.entry(b).or_insert(0) += 1;
                    kept.push(edge);
                }
            }
            kept
        }
    };

    debug!(before, after = kept.len(), "Edge pruning complete");
    kept
}

/// Drop noise edges: tag coincidence with no other supporting signal.
pub fn filter_noise_edges(edges: Vec<MergedEdge>) -> Vec<MergedEdge> {
    edges
        .into_iter()
        .filter(|e| {
            !(e.evidence.contains(Evidence::Tags)
                && !e.evidence.contains(Evidence::Ai)
                && !e.evidence.contains(Evidence::Explicit)
                && !e.evidence.contains(Evidence::TagsInferred))
        })
        .collect()
}
