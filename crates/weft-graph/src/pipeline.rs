//! The sequential pipeline driver.
//!
//! One invocation takes the loaded note batch end to end: tag scoring,
//! AI scoring (when the service is up), graph assembly, merge, pruning,
//! validation, and atomic persistence. Everything short of a storage
//! failure degrades; only `save_graph` errors propagate.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};
use uuid::Uuid;

use weft_core::{
    CandidateConnection, ConnectionMethod, Evidence, EvidenceSet, GenerationBackend, Graph,
    GraphMeta, Note, NoteKind, Result, RunContext, Stopwords, Suggestion,
};
use weft_core::text::collapse_ws;
use weft_inference::{analyze_connections, ParsedConnection};

use crate::candidates::{
    build_explicit_edges, build_note_nodes, build_tag_edges, build_tag_membership_edges,
    build_tag_nodes,
};
use crate::config::PipelineConfig;
use crate::merge::{merge_edges, prune_edges};
use crate::persist::save_graph;
use crate::scorer::{analyze_tags, ScoredCandidate};
use crate::validate::validate_graph_value;

/// Round a 0-1 score to four decimals for the persisted record.
fn round4(score: f32) -> f32 {
    (score * 10_000.0).round() / 10_000.0
}

/// Fold tag and AI results for one source note into viewer-format
/// suggestions.
fn consolidate(tag_results: &[ScoredCandidate], ai_results: &[ParsedConnection]) -> Vec<Suggestion> {
    let mut items = Vec::new();

    for cand in tag_results {
        let score01 = f32::from(cand.score) / 100.0;
        items.push(Suggestion {
            target_id: cand.id.to_string(),
            score: round4(score01),
            similarity: ((score01 * 100.0).round() as u8).min(99),
            reason: collapse_ws(&cand.reasons.join("; ")),
            method: ConnectionMethod::Tags,
        });
    }

    for conn in ai_results {
        items.push(Suggestion {
            target_id: conn.id.clone(),
            score: round4(conn.score),
            similarity: conn.similarity.min(99),
            reason: collapse_ws(&conn.reason),
            method: conn.method,
        });
    }

    items
}

/// Run the full connection pipeline over a note batch and persist the
/// resulting graph at `out_path`.
pub async fn run_pipeline(
    notes: &[Note],
    backend: &dyn GenerationBackend,
    config: &PipelineConfig,
    out_path: &Path,
) -> Result<Graph> {
    let ctx = RunContext::new(
        Stopwords::load(config.stopwords_path.as_deref()),
        config.reason_policy,
    );

    let ai_ok = backend.health_check().await.unwrap_or(false);
    if ai_ok {
        info!(model = backend.model_name(), "AI scoring service available");
    } else {
        warn!("AI scoring service unavailable; proceeding with tags only");
    }

    let permanents: Vec<&Note> = notes.iter().filter(|n| n.kind == NoteKind::Permanent).collect();
    let readings: Vec<&Note> = notes.iter().filter(|n| n.kind == NoteKind::Reading).collect();
    let indexes: Vec<&Note> = notes.iter().filter(|n| n.kind == NoteKind::Index).collect();
    info!(
        permanent = permanents.len(),
        reading = readings.len(),
        index = indexes.len(),
        "Notes loaded"
    );

    if permanents.is_empty() && readings.is_empty() {
        info!("No notes to analyze");
        return Ok(Graph::new(vec![], vec![]));
    }

    let mut suggestions: Vec<(Uuid, Vec<Suggestion>)> = Vec::new();

    // Reading notes are analyzed against permanent notes (tags + AI) and
    // against the other reading notes (tags only).
    for (i, note) in readings.iter().enumerate() {
        info!(
            note_id = %note.id,
            progress = %format!("{}/{}", i + 1, readings.len()),
            title = %note.title.chars().take(50).collect::<String>(),
            "Analyzing reading note"
        );
        sleep(Duration::from_millis(config.note_delay_ms)).await;

        let mut perm_tags = analyze_tags(
            note,
            &permanents,
            config.tags_min_score_keep,
            &config.weights,
        );
        perm_tags.truncate(config.tag_candidates_per_note);
        let found: HashSet<Uuid> = perm_tags.iter().map(|c| c.id).collect();

        let mut perm_ai = if ai_ok {
            analyze_connections(backend, &ctx, note, &permanents, &found, &config.connect).await
        } else {
            Vec::new()
        };
        perm_ai.truncate(config.ai_candidates_per_note);

        let other_readings: Vec<&Note> =
            readings.iter().copied().filter(|r| r.id != note.id).collect();
        let mut reading_tags = analyze_tags(
            note,
            &other_readings,
            config.tags_min_score_keep,
            &config.weights,
        );
        reading_tags.truncate(config.tag_candidates_per_note);

        let mut items = consolidate(&perm_tags, &perm_ai);
        items.extend(consolidate(&reading_tags, &[]));
        suggestions.push((note.id, items));
    }

    // Permanent notes are analyzed against the other permanent notes.
    for (i, note) in permanents.iter().enumerate() {
        info!(
            note_id = %note.id,
            progress = %format!("{}/{}", i + 1, permanents.len()),
            title = %note.title.chars().take(50).collect::<String>(),
            "Analyzing permanent note"
        );
        sleep(Duration::from_millis(config.note_delay_ms)).await;

        let others: Vec<&Note> =
            permanents.iter().copied().filter(|p| p.id != note.id).collect();
        let mut tags = analyze_tags(note, &others, config.tags_min_score_keep, &config.weights);
        tags.truncate(config.tag_candidates_per_note);
        let found: HashSet<Uuid> = tags.iter().map(|c| c.id).collect();

        let mut ai = if ai_ok {
            analyze_connections(backend, &ctx, note, &others, &found, &config.connect).await
        } else {
            Vec::new()
        };
        ai.truncate(config.ai_candidates_per_note);

        suggestions.push((note.id, consolidate(&tags, &ai)));
    }

    info!("Analysis complete; assembling graph");

    // Node set: notes in group order, then the tag pseudo-nodes.
    let ordered: Vec<Note> = permanents
        .iter()
        .chain(readings.iter())
        .chain(indexes.iter())
        .map(|n| (*n).clone())
        .collect();
    let mut nodes = build_note_nodes(&ordered);
    let tag_nodes = build_tag_nodes(&ordered);
    info!(result_count = tag_nodes.len(), "Tag pseudo-nodes created");
    nodes.extend(tag_nodes);

    // Raw edges: explicit links, membership edges, suggestion edges, then
    // direct tag-coincidence edges.
    let mut raw = build_explicit_edges(&ordered);
    raw.extend(build_tag_membership_edges(&ordered));
    for (source, items) in &suggestions {
        let src = source.to_string();
        for item in items {
            if item.target_id.is_empty() || item.target_id == src {
                continue;
            }
            let evidence = match item.method {
                ConnectionMethod::Tags => Evidence::Tags,
                ConnectionMethod::Ai | ConnectionMethod::AiFallback => Evidence::Ai,
            };
            raw.push(CandidateConnection {
                source: src.clone(),
                target: item.target_id.clone(),
                evidence: EvidenceSet::only(evidence),
                similarity: Some(item.similarity),
                score: Some(item.score),
                reason: item.reason.clone(),
                via_tags: vec![],
                dashes: evidence == Evidence::Ai,
            });
        }
    }
    raw.extend(build_tag_edges(&ordered, 1));

    let merged = merge_edges(&nodes, &raw, &ctx);
    let topk = (config.topk_per_node > 0).then_some(config.topk_per_node);
    let pruned = prune_edges(merged, Some(config.min_similarity_kept), topk);

    let mut graph = Graph::new(nodes, pruned);
    graph.meta = Some(GraphMeta {
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
        generated_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        min_similarity_kept: config.min_similarity_kept,
        topk_per_node: config.topk_per_node,
    });

    // Integrated validation; a validation failure is not allowed to cost us
    // the graph.
    let graph = match serde_json::to_value(&graph) {
        Ok(value) => {
            let (cleaned, stats) = validate_graph_value(&value, config.min_similarity_kept, true);
            info!(%stats, "Validation report");
            match serde_json::from_value::<Graph>(cleaned) {
                Ok(validated) => validated,
                Err(e) => {
                    warn!(error = %e, "Validated graph failed to load; writing unvalidated graph");
                    graph
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "Graph validation failed; writing unvalidated graph");
            graph
        }
    };

    save_graph(&graph, out_path)?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::Tag;
    use weft_inference::ConnectConfig;

    use self::fixtures::*;

    mod fixtures {
        use super::*;

        pub const ID_P1: &str = "11111111-1111-1111-1111-111111111111";
        pub const ID_P2: &str = "22222222-2222-2222-2222-222222222222";
        pub const ID_R1: &str = "33333333-3333-3333-3333-333333333333";
        pub const ID_IX: &str = "44444444-4444-4444-4444-444444444444";

        pub fn note(id: &str, kind: NoteKind, tags: &[&str], mentions: &[&str]) -> Note {
            Note {
                id: id.parse().unwrap(),
                title: format!("Note {}", &id[..2]),
                kind,
                tags: tags.iter().map(|t| Tag::new(*t)).collect(),
                projects: vec![],
                project_ids: vec![],
                content: String::new(),
                mentions: mentions.iter().map(|m| m.parse().unwrap()).collect(),
            }
        }

        pub fn fast_config() -> PipelineConfig {
            PipelineConfig {
                note_delay_ms: 0,
                connect: ConnectConfig {
                    call_delay_ms: 0,
                    backoff: 0.0,
                    ..ConnectConfig::default()
                },
                ..PipelineConfig::default()
            }
        }
    }

    #[tokio::test]
    async fn test_tags_only_run_produces_graph() {
        let backend = weft_inference::mock::MockBackend::new().with_service_error();
        let notes = [
            note(ID_P1, NoteKind::Permanent, &["rust", "graphs"], &[]),
            note(ID_P2, NoteKind::Permanent, &["rust", "graphs"], &[]),
            note(ID_IX, NoteKind::Index, &[], &[]),
        ];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("graph.json");

        let graph = run_pipeline(&notes, &backend, &fast_config(), &out)
            .await
            .unwrap();

        // 3 note nodes + 2 tag pseudo-nodes.
        assert_eq!(graph.nodes.len(), 5);
        // The two permanents share tags: at least the inferred edge plus
        // membership edges survive.
        assert!(graph
            .edges
            .iter()
            .any(|e| e.evidence.contains(Evidence::TagsInferred)));
        assert!(out.exists());
        assert!(graph.meta.is_some());
    }

    #[tokio::test]
    async fn test_explicit_mention_becomes_directed_edge() {
        let backend = weft_inference::mock::MockBackend::new().with_service_error();
        let notes = [
            note(ID_P1, NoteKind::Permanent, &[], &[ID_P2]),
            note(ID_P2, NoteKind::Permanent, &[], &[]),
        ];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("graph.json");

        let graph = run_pipeline(&notes, &backend, &fast_config(), &out)
            .await
            .unwrap();

        let explicit = graph
            .edges
            .iter()
            .find(|e| e.evidence.contains(Evidence::Explicit))
            .expect("explicit edge");
        assert_eq!(explicit.similarity, Some(100));
        assert!(explicit.directed);
        assert_eq!(explicit.direction_info, "source_to_target");
    }

    #[tokio::test]
    async fn test_empty_batch_skips_persistence() {
        let backend = weft_inference::mock::MockBackend::new();
        let notes = [note(ID_IX, NoteKind::Index, &[], &[])];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("graph.json");

        let graph = run_pipeline(&notes, &backend, &fast_config(), &out)
            .await
            .unwrap();

        assert!(graph.nodes.is_empty());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_ai_connection_lands_in_graph() {
        const GOOD_REASON: &str =
            "Both notes discuss deliberate practice applied to learning systems";
        let reply = format!(r#"[{{"id":"{}","similarity":82,"reason":"{}"}}]"#, ID_P2, GOOD_REASON);
        let backend = weft_inference::mock::MockBackend::new()
            .with_response(reply.clone())
            .with_response(reply);
        let notes = [
            note(ID_P1, NoteKind::Permanent, &[], &[]),
            note(ID_P2, NoteKind::Permanent, &[], &[]),
        ];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("graph.json");

        let graph = run_pipeline(&notes, &backend, &fast_config(), &out)
            .await
            .unwrap();

        let ai_edge = graph
            .edges
            .iter()
            .find(|e| e.evidence.contains(Evidence::Ai))
            .expect("ai edge");
        assert!(ai_edge.dashes);
        assert_eq!(ai_edge.similarity, Some(82));
        assert!(!ai_edge.directed);
    }

    #[tokio::test]
    async fn test_reading_note_scored_against_permanents() {
        let backend = weft_inference::mock::MockBackend::new().with_service_error();
        let notes = [
            note(ID_P1, NoteKind::Permanent, &["rust", "graphs"], &[]),
            note(ID_R1, NoteKind::Reading, &["rust", "graphs"], &[]),
        ];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("graph.json");

        let graph = run_pipeline(&notes, &backend, &fast_config(), &out)
            .await
            .unwrap();

        // Tag scoring links reading -> permanent (evidence "tags" via the
        // suggestion path, merged with the inferred tag edge).
        let cross = graph
            .edges
            .iter()
            .find(|e| {
                let pair = [e.source.as_str(), e.target.as_str()];
                pair.contains(&ID_P1) && pair.contains(&ID_R1)
            })
            .expect("cross edge");
        assert!(cross.evidence.contains(Evidence::Tags));
        assert!(cross.similarity.unwrap() >= 50);
    }
}
