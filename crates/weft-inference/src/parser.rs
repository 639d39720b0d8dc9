//! Robust parsing of AI scoring replies.
//!
//! The scoring service promises strict JSON and routinely breaks the
//! promise: code fences, prose around the payload, envelope objects,
//! renamed fields, batched list-valued entries, titles instead of UUIDs.
//! This module turns any of that into normalized connections referencing
//! only known candidate ids, or an empty list; it never errors.
//!
//! Extraction runs an ordered list of named strategies; when several JSON
//! blocks parse, the one whose shape best matches the expected reply wins.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use weft_core::ids::UUID_SEARCH_RE;
use weft_core::text::{collapse_ws, slugify};
use weft_core::{coerce_similarity, score_from_similarity, ConnectionMethod, Note, RunContext};

/// Reason substituted when the reply carries none.
pub const DEFAULT_AI_REASON: &str = "semantic match (AI)";

/// Fields that may carry the target identifier, in resolution order.
const ID_FIELDS: &[&str] = &[
    "id",
    "uuid",
    "target_id",
    "node_id",
    "page_id",
    "titulo",
    "title",
    "name",
];

/// Fields that may carry the similarity value.
const SIMILARITY_FIELDS: &[&str] = &["similarity", "similitud", "score", "confidence"];

/// Fields that may carry the reason text.
const REASON_FIELDS: &[&str] = &[
    "reason",
    "razon",
    "because",
    "rationale",
    "explanation",
    "why",
    "motivo",
];

/// Envelope keys the item list may hide under, one nesting level deep.
const ENVELOPE_KEYS: &[&str] = &[
    "connections",
    "connection",
    "conceptual_connections",
    "conexiones",
    "suggestions",
    "results",
    "items",
    "data",
    "result",
];

static FENCE_EDGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^```(?:json)?\s*|```\s*$").expect("static fence regex"));

static FENCED_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)```(?:jsonc?|javascript)?\s*(.*?)\s*```").expect("static fenced block regex")
});

static BRACKET_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*?\]|\{.*?\}").expect("static bracket regex"));

/// One normalized, accepted connection from an AI reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedConnection {
    /// Resolved candidate note id (dashed lowercase UUID).
    pub id: String,
    /// Candidate title, when known.
    pub title: String,
    /// Integer similarity 0-100.
    pub similarity: u8,
    /// Float score 0-1.
    pub score: f32,
    pub reason: String,
    pub method: ConnectionMethod,
}

/// Per-call skip counters, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub accepted: usize,
    pub skipped_id: usize,
    pub skipped_similarity: usize,
    pub skipped_reason: usize,
}

// ---------------------------------------------------------------------------
// JSON extraction strategies
// ---------------------------------------------------------------------------

fn parse_direct(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok()
}

fn parse_fence_stripped(text: &str) -> Option<Value> {
    let stripped = FENCE_EDGE_RE.replace_all(text.trim(), "");
    serde_json::from_str(stripped.trim()).ok()
}

/// Score how well a parsed value matches the expected reply shape.
/// Envelope objects whose keys hold dict lists beat bare arrays, which
/// beat everything else.
fn shape_score(value: &Value) -> i64 {
    match value {
        Value::Object(map) => {
            let mut hits = 0;
            let mut inner = 0;
            for key in ["conexiones", "connections", "suggestions", "results", "result"] {
                if let Some(v) = map.get(key) {
                    hits += 1;
                    if v.as_array()
                        .map(|a| a.iter().any(Value::is_object))
                        .unwrap_or(false)
                    {
                        inner += 1;
                    }
                }
            }
            2 * hits + inner
        }
        Value::Array(items) => 1 + i64::from(items.iter().any(Value::is_object)),
        _ => 0,
    }
}

/// The longest substring spanning the first `open` to the last `close`.
fn spanning_block(text: &str, open: char, close: char) -> Option<&str> {
    let first = text.find(open)?;
    let last = text.rfind(close)?;
    (last > first).then(|| &text[first..=last])
}

fn parse_block_scan(text: &str) -> Option<Value> {
    let mut blocks: Vec<String> = Vec::new();
    for cap in FENCED_BLOCK_RE.captures_iter(text) {
        if let Some(m) = cap.get(1) {
            blocks.push(m.as_str().to_string());
        }
    }
    // Longest array/object spans first, then the shorter delimited chunks;
    // a fragment never beats the block containing it.
    for span in [
        spanning_block(text, '[', ']'),
        spanning_block(text, '{', '}'),
    ]
    .into_iter()
    .flatten()
    {
        blocks.push(span.to_string());
    }
    for m in BRACKET_BLOCK_RE.find_iter(text) {
        blocks.push(m.as_str().to_string());
    }

    blocks.sort_by_key(|b| std::cmp::Reverse(b.len()));

    let mut parsed: Vec<Value> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for block in &blocks {
        let trimmed = block.trim();
        for trial in [trimmed, trimmed.trim_end_matches([',', ';'])] {
            if let Ok(value) = serde_json::from_str::<Value>(trial) {
                let key = value.to_string();
                if !seen.contains(&key) {
                    seen.push(key);
                    parsed.push(value);
                }
                break;
            }
        }
    }

    // Best shape wins; first parsed wins ties so the choice is stable.
    let mut best: Option<(i64, Value)> = None;
    for value in parsed {
        let score = shape_score(&value);
        if best.as_ref().map_or(true, |(b, _)| score > *b) {
            best = Some((score, value));
        }
    }
    best.filter(|(score, _)| *score > 0).map(|(_, value)| value)
}

type StrategyFn = fn(&str) -> Option<Value>;

/// The extraction ladder, in priority order.
const STRATEGIES: &[(&str, StrategyFn)] = &[
    ("direct", parse_direct),
    ("fence_stripped", parse_fence_stripped),
    ("block_scan", parse_block_scan),
];

/// Extract the most plausible JSON payload from a raw reply.
pub fn extract_json(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    for (name, strategy) in STRATEGIES.iter().copied() {
        if let Some(value) = strategy(text) {
            debug!(strategy = name, "JSON extracted from AI reply");
            return Some(value);
        }
    }
    debug!("No JSON found in AI reply");
    None
}

// ---------------------------------------------------------------------------
// Item collection and normalization
// ---------------------------------------------------------------------------

fn object_items(list: &[Value]) -> Vec<Map<String, Value>> {
    list.iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
}

/// Unwrap the payload down to its list of candidate items.
fn collect_items(data: &Value) -> Vec<Map<String, Value>> {
    match data {
        Value::Array(list) => object_items(list),
        Value::Object(map) => {
            // Direct envelope keys, then one nested level.
            for key in ENVELOPE_KEYS {
                match map.get(*key) {
                    Some(Value::Array(list)) => return object_items(list),
                    Some(Value::Object(inner)) => {
                        for key2 in ENVELOPE_KEYS {
                            if let Some(Value::Array(list)) = inner.get(*key2) {
                                return object_items(list);
                            }
                        }
                    }
                    _ => {}
                }
            }

            // Single-item object with the expected fields.
            if map.contains_key("id")
                && (map.contains_key("similarity") || map.contains_key("score"))
            {
                return vec![map.clone()];
            }

            // Dict keyed by UUID: each value with a similarity/reason/score
            // field is an item.
            let mut items = Vec::new();
            for (key, value) in map {
                if let Some(inner) = value.as_object() {
                    if inner.contains_key("similarity")
                        || inner.contains_key("reason")
                        || inner.contains_key("score")
                    {
                        let mut item = inner.clone();
                        item.insert("id".to_string(), Value::String(key.clone()));
                        items.push(item);
                    }
                }
            }
            items
        }
        _ => Vec::new(),
    }
}

/// Expand batch-style items (one `id` list with scalar or list
/// `similarity`/`reason`) into one item per id, broadcasting scalars.
fn expand_batches(items: Vec<Map<String, Value>>) -> Vec<Map<String, Value>> {
    let mut out = Vec::new();
    for item in items {
        let ids = match item.get("id") {
            Some(Value::Array(ids)) => ids.clone(),
            _ => {
                out.push(item);
                continue;
            }
        };

        let sims = item.get("similarity").cloned().unwrap_or(Value::Null);
        let reasons = item.get("reason").cloned().unwrap_or(Value::Null);

        for (i, id) in ids.iter().enumerate() {
            let sim = match &sims {
                Value::Array(list) => list.get(i).cloned().unwrap_or(Value::Null),
                other => other.clone(),
            };
            let reason = match &reasons {
                Value::Array(list) => list.get(i).cloned().unwrap_or(Value::Null),
                other => other.clone(),
            };
            let mut expanded = Map::new();
            expanded.insert("id".to_string(), id.clone());
            expanded.insert("similarity".to_string(), sim);
            expanded.insert("reason".to_string(), reason);
            out.push(expanded);
        }
    }
    out
}

fn string_field(item: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    for field in fields {
        if let Some(value) = item.get(*field) {
            match value {
                Value::String(s) if !s.trim().is_empty() => return Some(s.clone()),
                Value::Number(n) => return Some(n.to_string()),
                _ => {}
            }
        }
    }
    None
}

/// Strip leading/trailing brackets, parens, and whitespace off an id value.
fn strip_id(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| matches!(c, '[' | ']' | '(' | ')') || c.is_whitespace())
        .to_string()
}

/// Clean an identifier string for matching: drop container chars and
/// invisible unicode, unify dash variants.
fn clean_id_text(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '\u{200b}' | '\u{feff}'))
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            '\u{a0}' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim_matches(|c: char| matches!(c, '[' | ']' | '(' | ')' | '{' | '}' | '<' | '>'))
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Candidate index
// ---------------------------------------------------------------------------

/// Lookup indices over the candidate set, built once per call.
///
/// Resolution ladder: UUID inside the raw string, exact lowercase title,
/// diacritic-stripped slug, first-three-words partial, then relaxed
/// substring containment either way.
pub struct CandidateIndex {
    id_to_title: HashMap<String, String>,
    title_to_id: HashMap<String, String>,
    slug_to_id: HashMap<String, String>,
    partial_to_id: HashMap<String, String>,
    /// (lowercased title, id) in input order, for deterministic scans.
    titles: Vec<(String, String)>,
}

impl CandidateIndex {
    pub fn new<'a>(candidates: impl IntoIterator<Item = &'a Note>) -> Self {
        let mut index = Self {
            id_to_title: HashMap::new(),
            title_to_id: HashMap::new(),
            slug_to_id: HashMap::new(),
            partial_to_id: HashMap::new(),
            titles: Vec::new(),
        };

        for note in candidates {
            let id = note.id.to_string();
            let title = note.title.trim().to_string();
            index.id_to_title.insert(id.clone(), title.clone());
            if title.is_empty() {
                continue;
            }

            let lower = title.to_lowercase();
            index.title_to_id.entry(lower.clone()).or_insert(id.clone());
            index.titles.push((lower.clone(), id.clone()));

            index.slug_to_id.entry(slugify(&title)).or_insert(id.clone());

            let partial: Vec<&str> = lower.split_whitespace().take(3).collect();
            if !partial.is_empty() {
                index
                    .partial_to_id
                    .entry(partial.join(" "))
                    .or_insert(id.clone());
            }
        }
        index
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_to_title.contains_key(id)
    }

    pub fn title_of(&self, id: &str) -> &str {
        self.id_to_title.get(id).map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_title.is_empty()
    }

    /// Resolve a loosely specified identifier to a candidate id.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }
        let cleaned = clean_id_text(raw);

        // A UUID anywhere in the value decides the outcome: either it is a
        // known candidate or the item is discarded.
        if let Some(m) = UUID_SEARCH_RE.find(&cleaned) {
            let id = m.as_str().to_lowercase();
            return self.contains(&id).then_some(id);
        }

        let lower = cleaned.to_lowercase();

        if let Some(id) = self.title_to_id.get(&lower) {
            return Some(id.clone());
        }
        if let Some(id) = self.slug_to_id.get(&slugify(&lower)) {
            return Some(id.clone());
        }
        let partial: Vec<&str> = lower.split_whitespace().take(3).collect();
        if !partial.is_empty() {
            if let Some(id) = self.partial_to_id.get(&partial.join(" ")) {
                return Some(id.clone());
            }
        }
        for (title, id) in &self.titles {
            if title.contains(&lower) || lower.contains(title.as_str()) {
                return Some(id.clone());
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Stateless-per-call parser bound to one candidate set.
pub struct ResponseParser<'a> {
    index: CandidateIndex,
    ctx: &'a RunContext,
    min_similarity: u8,
}

impl<'a> ResponseParser<'a> {
    pub fn new(candidates: &[&Note], ctx: &'a RunContext, min_similarity: u8) -> Self {
        Self {
            index: CandidateIndex::new(candidates.iter().copied()),
            ctx,
            min_similarity,
        }
    }

    pub fn index(&self) -> &CandidateIndex {
        &self.index
    }

    /// Primary pass: strict field names, exact candidate ids, full
    /// acceptance filters. Returns accepted connections plus skip counters.
    pub fn parse_strict(&self, text: &str) -> (Vec<ParsedConnection>, ParseStats) {
        let mut stats = ParseStats::default();
        let mut out = Vec::new();

        let Some(data) = extract_json(text) else {
            return (out, stats);
        };

        for item in expand_batches(collect_items(&data)) {
            let raw_id = string_field(&item, &["id", "uuid"]).unwrap_or_default();
            let id = strip_id(&raw_id).to_lowercase();
            if id.is_empty() || !self.index.contains(&id) {
                stats.skipped_id += 1;
                continue;
            }

            let sim = SIMILARITY_FIELDS
                .iter()
                .find_map(|f| item.get(*f))
                .and_then(coerce_similarity);
            let Some(sim) = sim.filter(|s| *s >= self.min_similarity) else {
                stats.skipped_similarity += 1;
                continue;
            };

            let reason = collapse_ws(&string_field(&item, REASON_FIELDS).unwrap_or_default());
            if !self.ctx.reason_ok(&reason) {
                stats.skipped_reason += 1;
                continue;
            }

            out.push(ParsedConnection {
                title: self.index.title_of(&id).to_string(),
                id,
                similarity: sim,
                score: score_from_similarity(sim),
                reason,
                method: ConnectionMethod::Ai,
            });
        }

        stats.accepted = out.len();
        debug!(
            accepted = stats.accepted,
            skipped_id = stats.skipped_id,
            skipped_similarity = stats.skipped_similarity,
            skipped_reason = stats.skipped_reason,
            "Strict parse finished"
        );
        (out, stats)
    }

    /// Secondary best-effort pass: full identifier resolution ladder,
    /// defaulted scores and reasons, then the never-failing fallback
    /// ladder over the raw text.
    pub fn parse_relaxed(&self, text: &str) -> Vec<ParsedConnection> {
        let mut out = Vec::new();

        if let Some(data) = extract_json(text) {
            for item in expand_batches(collect_items(&data)) {
                let resolved = ID_FIELDS.iter().find_map(|field| {
                    item.get(*field)
                        .and_then(|v| match v {
                            Value::String(s) => Some(s.clone()),
                            Value::Number(n) => Some(n.to_string()),
                            _ => None,
                        })
                        .and_then(|raw| self.index.resolve(&raw))
                });
                let Some(id) = resolved else {
                    debug!("Could not resolve id from item");
                    continue;
                };

                let raw_sim = SIMILARITY_FIELDS
                    .iter()
                    .find_map(|f| item.get(*f))
                    .and_then(coerce_similarity);
                // When the reply carries no numeric field at all, a neutral
                // 0.5 stands in and the floor check is waived.
                if let Some(sim) = raw_sim {
                    if sim < self.min_similarity {
                        continue;
                    }
                }
                let similarity = raw_sim.unwrap_or(50);

                let reason = match string_field(&item, REASON_FIELDS) {
                    Some(r) => collapse_ws(&r),
                    None => DEFAULT_AI_REASON.to_string(),
                };
                if !self.ctx.reason_ok(&reason) {
                    continue;
                }

                out.push(ParsedConnection {
                    title: self.index.title_of(&id).to_string(),
                    id,
                    similarity,
                    score: score_from_similarity(similarity),
                    reason,
                    method: ConnectionMethod::Ai,
                });
            }
        }

        if out.is_empty() {
            out = self.fallback_uuid_scan(text);
        }
        if out.is_empty() {
            out = self.fallback_title_scan(text);
        }
        out
    }

    /// Fallback (a): any bare candidate UUID in the raw text.
    fn fallback_uuid_scan(&self, text: &str) -> Vec<ParsedConnection> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for m in UUID_SEARCH_RE.find_iter(text) {
            let id = m.as_str().to_lowercase();
            if seen.contains(&id) || !self.index.contains(&id) {
                continue;
            }
            seen.push(id.clone());
            out.push(ParsedConnection {
                title: self.index.title_of(&id).to_string(),
                id,
                similarity: 50,
                score: 0.5,
                reason: "fallback: UUID present in response (no JSON)".to_string(),
                method: ConnectionMethod::AiFallback,
            });
        }
        out
    }

    /// Fallback (b): any candidate's exact lowercase title in the raw text.
    fn fallback_title_scan(&self, text: &str) -> Vec<ParsedConnection> {
        let lower = text.to_lowercase();
        let mut out = Vec::new();
        for (title, id) in &self.index.titles {
            if !title.is_empty() && lower.contains(title.as_str()) {
                out.push(ParsedConnection {
                    id: id.clone(),
                    title: self.index.title_of(id).to_string(),
                    similarity: 40,
                    score: 0.4,
                    reason: "fallback: title detected in response (no JSON)".to_string(),
                    method: ConnectionMethod::AiFallback,
                });
            }
        }
        out
    }
}
