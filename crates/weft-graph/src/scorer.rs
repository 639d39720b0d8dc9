//! Tag and keyword similarity scoring.
//!
//! Pure functions: no external calls, no state. Two notes score points for
//! shared normalized tags and for overlapping content keywords; the total
//! is clamped below 100 so explicit links always outrank inferred ones.

use std::collections::HashMap;

use uuid::Uuid;

use weft_core::defaults;
use weft_core::text::{extract_keywords, normalize_tagset};
use weft_core::Note;

/// Scoring weights, all capped contributions.
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    /// Points per shared normalized tag.
    pub points_per_tag: u32,
    /// Cap on the tag contribution.
    pub max_points_from_tags: u32,
    /// Minimum keyword length considered.
    pub keyword_min_len: usize,
    /// Points per unit of keyword overlap frequency.
    pub keyword_points_per_overlap: u32,
    /// Cap on the keyword contribution.
    pub keyword_max_points: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            points_per_tag: defaults::TAG_POINTS_PER_COMMON_TAG,
            max_points_from_tags: defaults::TAG_MAX_POINTS_FROM_TAGS,
            keyword_min_len: defaults::KEYWORD_MIN_LEN,
            keyword_points_per_overlap: defaults::KEYWORD_POINTS_PER_OVERLAP,
            keyword_max_points: defaults::KEYWORD_MAX_POINTS,
        }
    }
}

/// A candidate that passed the keep threshold.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub id: Uuid,
    pub title: String,
    /// 0-99.
    pub score: u8,
    pub reasons: Vec<String>,
}

/// Score the similarity of two notes from shared tags and keyword overlap.
///
/// Returns the clamped score and the human-readable reasons that earned it.
pub fn tag_similarity(a: &Note, b: &Note, weights: &ScoreWeights) -> (u8, Vec<String>) {
    let mut score: u32 = 0;
    let mut reasons = Vec::new();

    // 1) Shared tags, matched case- and accent-insensitively.
    let tags_a = normalize_tagset(a.tag_names());
    let tags_b = normalize_tagset(b.tag_names());
    let common: Vec<&String> = tags_a.intersection(&tags_b).collect();
    if !common.is_empty() {
        score += (common.len() as u32 * weights.points_per_tag).min(weights.max_points_from_tags);
        let shown: Vec<&str> = common.iter().take(3).map(|s| s.as_str()).collect();
        reasons.push(format!("Common tags ({}): {}", common.len(), shown.join(", ")));
    }

    // 2) Keyword overlap with multiset semantics.
    let kw_a = extract_keywords(&a.content, weights.keyword_min_len);
    let kw_b = extract_keywords(&b.content, weights.keyword_min_len);
    if !kw_a.is_empty() && !kw_b.is_empty() {
        let mut count_a: HashMap<&str, u32> = HashMap::new();
        for w in &kw_a {
            *count_a.entry(w.as_str()).or_default() += 1;
        }
        let mut count_b: HashMap<&str, u32> = HashMap::new();
        for w in &kw_b {
            *count_b.entry(w.as_str()).or_default() += 1;
        }

        let mut shared: Vec<(&str, u32)> = count_a
            .iter()
            .filter_map(|(w, ca)| count_b.get(w).map(|cb| (*w, ca + cb)))
            .collect();
        if !shared.is_empty() {
            let freq: u32 = shared
                .iter()
                .map(|(w, _)| count_a[w].min(count_b[w]))
                .sum();
            score += (freq * weights.keyword_points_per_overlap).min(weights.keyword_max_points);

            // Top concepts by combined frequency; name for determinism.
            shared.sort_by(|(wa, ca), (wb, cb)| cb.cmp(ca).then(wa.cmp(wb)));
            let top: Vec<&str> = shared.iter().take(2).map(|(w, _)| *w).collect();
            reasons.push(format!("Common concepts: {}", top.join(", ")));
        }
    }

    (
        score.min(u32::from(defaults::TAG_SCORE_CEILING)) as u8,
        reasons,
    )
}

/// Score one note against every candidate, keeping those at or above the
/// threshold, ordered by score descending (stable on input order).
pub fn analyze_tags(
    note: &Note,
    candidates: &[&Note],
    threshold: u8,
    weights: &ScoreWeights,
) -> Vec<ScoredCandidate> {
    let mut out: Vec<ScoredCandidate> = candidates
        .iter()
        .filter_map(|cand| {
            let (score, reasons) = tag_similarity(note, cand, weights);
            (score >= threshold).then(|| ScoredCandidate {
                id: cand.id,
                title: cand.title.clone(),
                score,
                reasons,
            })
        })
        .collect();
    out.sort_by_key(|c| std::cmp::Reverse(c.score));
    out
}
