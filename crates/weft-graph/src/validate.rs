//! Standalone graph validation.
//!
//! Operates on raw JSON values so externally produced files, whatever
//! extra fields they carry, pass through untouched except for the cleaned
//! parts. Two shapes are auto-detected: the `{nodes, edges}` graph format
//! and the legacy mapping of source id to target records.

use serde_json::{json, Map, Value};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::info;

use weft_core::ids::is_valid_node_id;
use weft_core::similarity_from_score;

/// Counters for a graph-shape validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub total_nodes: usize,
    pub valid_nodes: usize,
    pub total_edges: usize,
    pub kept_edges: usize,
    pub removed_selfloops: usize,
    pub removed_invalid_ids: usize,
    pub removed_low_sim: usize,
    pub dedup_merged: usize,
}

impl std::fmt::Display for ValidationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "VALIDATION (GRAPH)")?;
        writeln!(f, "──────────────────────────────")?;
        writeln!(f, "Nodes:  {}/{} valid", self.valid_nodes, self.total_nodes)?;
        writeln!(f, "Edges:  {}/{} kept", self.kept_edges, self.total_edges)?;
        writeln!(f, " - removed_selfloops:   {}", self.removed_selfloops)?;
        writeln!(f, " - removed_invalid_ids: {}", self.removed_invalid_ids)?;
        writeln!(f, " - removed_low_sim:     {}", self.removed_low_sim)?;
        write!(f, " - dedup_merged:        {}", self.dedup_merged)
    }
}

/// Counters for a legacy-shape validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyStats {
    pub total_sources: usize,
    pub valid_sources: usize,
    pub total_targets: usize,
    pub valid_targets: usize,
    pub removed_selfloops: usize,
    pub removed_invalid_ids: usize,
}

impl std::fmt::Display for LegacyStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "VALIDATION (LEGACY MAP)")?;
        writeln!(f, "──────────────────────────────")?;
        writeln!(f, "Sources: {}/{} valid", self.valid_sources, self.total_sources)?;
        writeln!(f, "Targets: {}/{} valid", self.valid_targets, self.total_targets)?;
        writeln!(f, " - removed_selfloops:   {}", self.removed_selfloops)?;
        write!(f, " - removed_invalid_ids: {}", self.removed_invalid_ids)
    }
}

/// Outcome of an auto-detected validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReport {
    Graph(ValidationStats),
    Legacy(LegacyStats),
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationReport::Graph(stats) => stats.fmt(f),
            ValidationReport::Legacy(stats) => stats.fmt(f),
        }
    }
}

fn value_is_uuid(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| is_valid_node_id(s))
}

/// Derive the integer similarity for an edge/target record: the
/// `similarity` field when present, else converted from `score`, else 0.
fn edge_similarity(record: &Map<String, Value>) -> u8 {
    if let Some(sim) = record.get("similarity").and_then(Value::as_f64) {
        return sim.round().clamp(0.0, 255.0) as u8;
    }
    if let Some(score) = record.get("score").and_then(Value::as_f64) {
        return similarity_from_score(score);
    }
    0
}

/// Merge two edge records sharing an unordered endpoint pair: similarity
/// and score take the maximum; evidence and reasons are unioned.
fn merge_edge_records(a: &Map<String, Value>, b: &Map<String, Value>) -> Map<String, Value> {
    let mut out = a.clone();

    let sim_a = a.get("similarity").and_then(Value::as_f64);
    let sim_b = b.get("similarity").and_then(Value::as_f64);
    if sim_a.is_some() || sim_b.is_some() {
        let merged = sim_a.unwrap_or(0.0).max(sim_b.unwrap_or(0.0));
        out.insert("similarity".to_string(), json!(merged.round() as i64));
    }

    let score_a = a.get("score").and_then(Value::as_f64);
    let score_b = b.get("score").and_then(Value::as_f64);
    if score_a.is_some() || score_b.is_some() {
        let merged = score_a.unwrap_or(0.0).max(score_b.unwrap_or(0.0));
        out.insert("score".to_string(), json!(merged));
    }

    let mut evidence: BTreeSet<String> = BTreeSet::new();
    for record in [a, b] {
        match record.get("evidence") {
            Some(Value::Array(list)) => {
                evidence.extend(list.iter().filter_map(Value::as_str).map(String::from));
            }
            Some(Value::String(s)) => {
                evidence.insert(s.clone());
            }
            _ => {}
        }
    }
    if !evidence.is_empty() {
        out.insert(
            "evidence".to_string(),
            Value::Array(evidence.into_iter().map(Value::String).collect()),
        );
    }

    let mut reasons: Vec<String> = Vec::new();
    for record in [a, b] {
        match record.get("reasons") {
            Some(Value::Array(list)) => {
                for reason in list.iter().filter_map(Value::as_str) {
                    if !reason.is_empty() && !reasons.iter().any(|r| r == reason) {
                        reasons.push(reason.to_string());
                    }
                }
            }
            Some(Value::String(s)) if !s.is_empty() => {
                if !reasons.iter().any(|r| r == s) {
                    reasons.push(s.clone());
                }
            }
            _ => {}
        }
    }
    if !reasons.is_empty() {
        out.insert(
            "reasons".to_string(),
            Value::Array(reasons.into_iter().map(Value::String).collect()),
        );
    }

    out
}

/// Validate and clean a `{nodes, edges}` graph value.
pub fn validate_graph_value(graph: &Value, min_sim: u8, dedup: bool) -> (Value, ValidationStats) {
    let empty = Vec::new();
    let nodes = graph
        .get("nodes")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let edges = graph
        .get("edges")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut stats = ValidationStats {
        total_nodes: nodes.len(),
        total_edges: edges.len(),
        ..ValidationStats::default()
    };

    // Nodes with a valid id survive.
    let mut valid_nodes = Vec::new();
    let mut node_ids: HashSet<&str> = HashSet::new();
    for node in nodes {
        if let Some(id) = value_is_uuid(node.get("id")) {
            valid_nodes.push(node.clone());
            node_ids.insert(id);
        }
    }
    stats.valid_nodes = valid_nodes.len();

    // Normalize and filter edges.
    let mut cleaned: Vec<Map<String, Value>> = Vec::new();
    for edge in edges {
        let Some(record) = edge.as_object() else {
            stats.removed_invalid_ids += 1;
            continue;
        };
        let source = value_is_uuid(record.get("source"));
        let target = value_is_uuid(record.get("target"));
        let (Some(source), Some(target)) = (source, target) else {
            stats.removed_invalid_ids += 1;
            continue;
        };
        if !node_ids.contains(source) || !node_ids.contains(target) {
            stats.removed_invalid_ids += 1;
            continue;
        }
        if source == target {
            stats.removed_selfloops += 1;
            continue;
        }

        let similarity = edge_similarity(record);
        if similarity < min_sim {
            stats.removed_low_sim += 1;
            continue;
        }

        let mut normalized = record.clone();
        normalized.insert("similarity".to_string(), json!(similarity));
        normalized.insert(
            "dashes".to_string(),
            json!(record.get("dashes").and_then(Value::as_bool).unwrap_or(false)),
        );
        if let Some(Value::String(ev)) = record.get("evidence") {
            normalized.insert("evidence".to_string(), json!([ev]));
        }
        cleaned.push(normalized);
    }

    // Undirected dedup: one record per sorted endpoint pair.
    if dedup {
        let mut order: Vec<(String, String)> = Vec::new();
        let mut merged: HashMap<(String, String), Map<String, Value>> = HashMap::new();
        for record in cleaned {
            let source = record["source"].as_str().unwrap_or_default().to_string();
            let target = record["target"].as_str().unwrap_or_default().to_string();
            let key = if source < target {
                (source, target)
            } else {
                (target, source)
            };
            match merged.entry(key) {
                Entry::Occupied(mut entry) => {
                    let combined = merge_edge_records(entry.get(), &record);
                    entry.insert(combined);
                    stats.dedup_merged += 1;
                }
                Entry::Vacant(entry) => {
                    order.push(entry.key().clone());
                    entry.insert(record);
                }
            }
        }
        cleaned = order
            .into_iter()
            .filter_map(|key| merged.remove(&key))
            .collect();
    }

    stats.kept_edges = cleaned.len();

    let mut out = graph.as_object().cloned().unwrap_or_default();
    out.insert("nodes".to_string(), Value::Array(valid_nodes));
    out.insert(
        "edges".to_string(),
        Value::Array(cleaned.into_iter().map(Value::Object).collect()),
    );
    (Value::Object(out), stats)
}

/// Validate and clean a legacy source-to-targets mapping.
pub fn validate_legacy_value(mapping: &Value, min_sim: u8) -> (Value, LegacyStats) {
    let mut stats = LegacyStats::default();
    let mut out = Map::new();

    let Some(mapping) = mapping.as_object() else {
        return (Value::Object(out), stats);
    };

    for (source, targets) in mapping {
        stats.total_sources += 1;
        if !is_valid_node_id(source) {
            continue;
        }
        stats.valid_sources += 1;

        let mut fixed = Vec::new();
        for item in targets.as_array().map(|a| a.as_slice()).unwrap_or(&[]) {
            stats.total_targets += 1;
            let Some(record) = item.as_object() else {
                stats.removed_invalid_ids += 1;
                continue;
            };
            let Some(target) = value_is_uuid(record.get("target_id")) else {
                stats.removed_invalid_ids += 1;
                continue;
            };
            if target == source {
                stats.removed_selfloops += 1;
                continue;
            }

            let similarity = edge_similarity(record);
            if similarity < min_sim {
                continue;
            }

            let mut normalized = record.clone();
            normalized.insert("similarity".to_string(), json!(similarity));
            fixed.push(Value::Object(normalized));
        }

        if !fixed.is_empty() {
            stats.valid_targets += fixed.len();
            out.insert(source.clone(), Value::Array(fixed));
        }
    }

    (Value::Object(out), stats)
}

/// Auto-detect the shape of `data` and validate it.
pub fn validate_value(data: &Value, min_sim: u8, dedup: bool) -> (Value, ValidationReport) {
    let is_graph = data
        .as_object()
        .map(|m| m.contains_key("nodes") && m.contains_key("edges"))
        .unwrap_or(false);

    if is_graph {
        let (cleaned, stats) = validate_graph_value(data, min_sim, dedup);
        info!(
            node_count = stats.valid_nodes,
            edge_count = stats.kept_edges,
            removed_selfloops = stats.removed_selfloops,
            removed_invalid_ids = stats.removed_invalid_ids,
            removed_low_sim = stats.removed_low_sim,
            "Graph validation complete"
        );
        (cleaned, ValidationReport::Graph(stats))
    } else {
        let (cleaned, stats) = validate_legacy_value(data, min_sim);
        info!(
            valid_sources = stats.valid_sources,
            valid_targets = stats.valid_targets,
            "Legacy map validation complete"
        );
        (cleaned, ValidationReport::Legacy(stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID_A: &str = "11111111-1111-1111-1111-111111111111";
    const ID_B: &str = "22222222-2222-2222-2222-222222222222";

    #[test]
    fn test_selfloop_removed_and_counted() {
        let graph = json!({
            "nodes": [{"id": ID_A}],
            "edges": [{"source": ID_A, "target": ID_A, "similarity": 90}]
        });
        let (cleaned, stats) = validate_graph_value(&graph, 0, true);

        assert_eq!(stats.removed_selfloops, 1);
        assert_eq!(cleaned["edges"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_edge_to_missing_node_counted_invalid() {
        let graph = json!({
            "nodes": [{"id": ID_A}],
            "edges": [{"source": ID_A, "target": ID_B, "similarity": 90}]
        });
        let (_, stats) = validate_graph_value(&graph, 0, true);
        assert_eq!(stats.removed_invalid_ids, 1);
        assert_eq!(stats.kept_edges, 0);
    }

    #[test]
    fn test_malformed_id_counted_invalid() {
        let graph = json!({
            "nodes": [{"id": ID_A}, {"id": "not-a-uuid"}],
            "edges": [{"source": ID_A, "target": "not-a-uuid", "similarity": 90}]
        });
        let (cleaned, stats) = validate_graph_value(&graph, 0, true);

        assert_eq!(stats.valid_nodes, 1);
        assert_eq!(stats.removed_invalid_ids, 1);
        assert_eq!(cleaned["nodes"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_tag_pseudo_node_id_is_valid() {
        let graph = json!({
            "nodes": [{"id": ID_A}, {"id": "tag::rust"}],
            "edges": [{"source": ID_A, "target": "tag::rust", "similarity": 100}]
        });
        let (_, stats) = validate_graph_value(&graph, 0, true);
        assert_eq!(stats.valid_nodes, 2);
        assert_eq!(stats.kept_edges, 1);
    }

    #[test]
    fn test_similarity_derived_from_fractional_score() {
        let graph = json!({
            "nodes": [{"id": ID_A}, {"id": ID_B}],
            "edges": [{"source": ID_A, "target": ID_B, "score": 0.8}]
        });
        let (cleaned, stats) = validate_graph_value(&graph, 55, true);

        assert_eq!(stats.kept_edges, 1);
        assert_eq!(cleaned["edges"][0]["similarity"], json!(80));
    }

    #[test]
    fn test_similarity_derived_from_whole_score() {
        let graph = json!({
            "nodes": [{"id": ID_A}, {"id": ID_B}],
            "edges": [{"source": ID_A, "target": ID_B, "score": 80.0}]
        });
        let (cleaned, _) = validate_graph_value(&graph, 55, true);
        assert_eq!(cleaned["edges"][0]["similarity"], json!(80));
    }

    #[test]
    fn test_low_similarity_removed_and_counted() {
        let graph = json!({
            "nodes": [{"id": ID_A}, {"id": ID_B}],
            "edges": [{"source": ID_A, "target": ID_B, "similarity": 40}]
        });
        let (_, stats) = validate_graph_value(&graph, 55, true);
        assert_eq!(stats.removed_low_sim, 1);
        assert_eq!(stats.kept_edges, 0);
    }

    #[test]
    fn test_dedup_merges_unordered_pair() {
        let graph = json!({
            "nodes": [{"id": ID_A}, {"id": ID_B}],
            "edges": [
                {"source": ID_A, "target": ID_B, "similarity": 70,
                 "evidence": ["ai"], "reasons": ["first reason"]},
                {"source": ID_B, "target": ID_A, "similarity": 90,
                 "evidence": ["explicit"], "reasons": ["second reason"]}
            ]
        });
        let (cleaned, stats) = validate_graph_value(&graph, 0, true);

        assert_eq!(stats.dedup_merged, 1);
        assert_eq!(stats.kept_edges, 1);
        let edge = &cleaned["edges"][0];
        assert_eq!(edge["similarity"], json!(90));
        assert_eq!(edge["evidence"], json!(["ai", "explicit"]));
        assert_eq!(edge["reasons"], json!(["first reason", "second reason"]));
    }

    #[test]
    fn test_dedup_disabled_keeps_both() {
        let graph = json!({
            "nodes": [{"id": ID_A}, {"id": ID_B}],
            "edges": [
                {"source": ID_A, "target": ID_B, "similarity": 70},
                {"source": ID_B, "target": ID_A, "similarity": 90}
            ]
        });
        let (_, stats) = validate_graph_value(&graph, 0, false);
        assert_eq!(stats.kept_edges, 2);
        assert_eq!(stats.dedup_merged, 0);
    }

    #[test]
    fn test_string_evidence_normalized_to_list() {
        let graph = json!({
            "nodes": [{"id": ID_A}, {"id": ID_B}],
            "edges": [{"source": ID_A, "target": ID_B, "similarity": 80, "evidence": "ai"}]
        });
        let (cleaned, _) = validate_graph_value(&graph, 0, true);
        assert_eq!(cleaned["edges"][0]["evidence"], json!(["ai"]));
    }

    #[test]
    fn test_unknown_edge_fields_pass_through() {
        let graph = json!({
            "nodes": [{"id": ID_A}, {"id": ID_B}],
            "edges": [{"source": ID_A, "target": ID_B, "similarity": 80, "color": "red"}]
        });
        let (cleaned, _) = validate_graph_value(&graph, 0, true);
        assert_eq!(cleaned["edges"][0]["color"], json!("red"));
    }

    #[test]
    fn test_legacy_shape_detected_and_cleaned() {
        let legacy = json!({
            ID_A: [
                {"target_id": ID_B, "score": 0.9},
                {"target_id": ID_A, "score": 0.9},
                {"target_id": "junk", "score": 0.9}
            ],
            "bad-source": [{"target_id": ID_B, "score": 0.9}]
        });
        let (cleaned, report) = validate_value(&legacy, 55, true);

        let ValidationReport::Legacy(stats) = report else {
            panic!("expected legacy report");
        };
        assert_eq!(stats.total_sources, 2);
        assert_eq!(stats.valid_sources, 1);
        assert_eq!(stats.removed_selfloops, 1);
        assert_eq!(stats.removed_invalid_ids, 1);
        assert_eq!(stats.valid_targets, 1);
        assert_eq!(cleaned[ID_A][0]["similarity"], json!(90));
    }

    #[test]
    fn test_graph_shape_detected() {
        let graph = json!({"nodes": [], "edges": []});
        let (_, report) = validate_value(&graph, 55, true);
        assert!(matches!(report, ValidationReport::Graph(_)));
    }

    #[test]
    fn test_legacy_low_sim_target_dropped_silently() {
        let legacy = json!({ID_A: [{"target_id": ID_B, "similarity": 10}]});
        let (cleaned, report) = validate_value(&legacy, 55, true);

        let ValidationReport::Legacy(stats) = report else {
            panic!("expected legacy report");
        };
        assert_eq!(stats.valid_targets, 0);
        assert!(cleaned.as_object().unwrap().is_empty());
    }
}
