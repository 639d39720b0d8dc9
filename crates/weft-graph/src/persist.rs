//! Atomic graph persistence.
//!
//! The graph file is the only durable artifact of a run, so a reader must
//! never observe a partial write: the JSON is written to a sibling `.tmp`
//! path, flushed and synced, then renamed over the destination.
//!
//! Persistence errors are the one failure class that propagates: a missing
//! graph is worse than a crashed run.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use weft_core::{Graph, Result};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomic(value: &Value, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        let body = serde_json::to_string_pretty(value)?;
        file.write_all(body.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Atomically write the final graph.
pub fn save_graph(graph: &Graph, path: &Path) -> Result<()> {
    let value = serde_json::to_value(graph)?;
    write_atomic(&value, path)?;
    info!(
        path = %path.display(),
        node_count = graph.nodes.len(),
        edge_count = graph.edges.len(),
        "Final graph saved"
    );
    Ok(())
}

/// Atomically write an arbitrary JSON value (validator CLI output).
pub fn save_json(value: &Value, path: &Path) -> Result<()> {
    write_atomic(value, path)
}

/// Read a JSON file.
pub fn load_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("graph.json");

        let graph = Graph::new(vec![], vec![]);
        save_graph(&graph, &path).unwrap();

        let loaded = load_json(&path).unwrap();
        assert_eq!(loaded["nodes"], json!([]));
        assert_eq!(loaded["edges"], json!([]));
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");

        save_json(&json!({"ok": true}), &path).unwrap();

        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_overwrite_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");

        save_json(&json!({"version": 1}), &path).unwrap();
        save_json(&json!({"version": 2}), &path).unwrap();

        let loaded = load_json(&path).unwrap();
        assert_eq!(loaded["version"], json!(2));
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(load_json(Path::new("/definitely/not/here.json")).is_err());
    }
}
