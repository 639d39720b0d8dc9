//! Stopword set loading.
//!
//! The reason-quality filter needs a language-appropriate stopword list.
//! The list lives in a JSON file, either a bare array of words or an
//! object with an `"all"` key, and is loaded once per run. A missing or
//! unreadable file degrades to the empty set: reason validation then counts
//! every token as a content word rather than blocking the run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;

/// Environment variable overriding the stopword file location.
pub const STOPWORDS_PATH_ENV: &str = "WEFT_STOPWORDS_PATH";

/// An immutable set of lowercase stopwords.
#[derive(Debug, Clone, Default)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    /// Empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from an explicit word list (used by tests and fixtures).
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Load from a JSON file: either `["word", ...]` or `{"all": ["word", ...]}`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;

        let list = match &value {
            serde_json::Value::Array(items) => items.as_slice(),
            serde_json::Value::Object(map) => map
                .get("all")
                .and_then(|v| v.as_array())
                .map(|a| a.as_slice())
                .unwrap_or(&[]),
            _ => &[],
        };

        let words: HashSet<String> = list
            .iter()
            .filter_map(|v| v.as_str())
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        Ok(Self { words })
    }

    /// Load from the first usable candidate path, degrading to the empty
    /// set when nothing loads. Candidates, in order: the explicit path,
    /// the `WEFT_STOPWORDS_PATH` env var, `config/stopwords.json`, then
    /// `stopwords.json` in the working directory.
    pub fn load(explicit: Option<&Path>) -> Self {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(p) = explicit {
            candidates.push(p.to_path_buf());
        }
        if let Ok(env_path) = std::env::var(STOPWORDS_PATH_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                candidates.push(PathBuf::from(trimmed));
            }
        }
        candidates.push(PathBuf::from("config/stopwords.json"));
        candidates.push(PathBuf::from("stopwords.json"));

        let mut seen = HashSet::new();
        for path in candidates {
            if !seen.insert(path.clone()) {
                continue;
            }
            if !path.is_file() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(sw) => {
                    info!(path = %path.display(), words = sw.len(), "Stopwords loaded");
                    return sw;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read stopwords file");
                }
            }
        }

        warn!("No stopword file found; continuing without stopwords");
        Self::empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        f.write_all(content.as_bytes()).expect("write");
        f
    }

    #[test]
    fn test_from_file_bare_list() {
        let f = write_temp(r#"["el", "la", "AND", " de "]"#);
        let sw = Stopwords::from_file(f.path()).unwrap();
        assert_eq!(sw.len(), 4);
        assert!(sw.contains("and"));
        assert!(sw.contains("de"));
    }

    #[test]
    fn test_from_file_all_key() {
        let f = write_temp(r#"{"all": ["un", "una"], "ignored": ["x"]}"#);
        let sw = Stopwords::from_file(f.path()).unwrap();
        assert_eq!(sw.len(), 2);
        assert!(sw.contains("una"));
        assert!(!sw.contains("x"));
    }

    #[test]
    fn test_from_file_invalid_json_errors() {
        let f = write_temp("not json at all");
        assert!(Stopwords::from_file(f.path()).is_err());
    }

    #[test]
    fn test_load_missing_degrades_to_empty() {
        let sw = Stopwords::load(Some(Path::new("/definitely/not/here.json")));
        assert!(sw.is_empty());
    }

    #[test]
    fn test_from_words() {
        let sw = Stopwords::from_words(["The", "a", ""]);
        assert_eq!(sw.len(), 2);
        assert!(sw.contains("the"));
    }
}
