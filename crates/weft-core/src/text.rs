//! Text normalization and tokenization helpers.
//!
//! Tag names and free text arrive in mixed case with Latin diacritics;
//! matching is case- and accent-insensitive throughout. Diacritic folding
//! covers the accented Latin range the note corpus actually uses.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Word tokens for reason validation: letter runs including apostrophes.
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-zÀ-ÖØ-öø-ÿ']+").expect("static word regex"));

static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("static non-word regex"));

static SLUG_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("static slug strip regex"));

static SLUG_DASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\s]+").expect("static slug dash regex"));

static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static ws regex"));

/// Built-in stoplist for keyword extraction. Deliberately small; the full
/// stopword set used for reason validation is loaded per run.
static KEYWORD_STOPLIST: &[&str] = &[
    "para", "como", "sobre", "desde", "entre", "donde", "cuando", "aunque", "porque", "entonces",
    "también", "este", "esta", "però", "amb", "per", "aquest", "aquesta", "això", "esto", "que",
    "con", "les", "los", "els", "this", "that", "with", "from", "about", "into", "their", "which",
];

/// Fold a single accented Latin character to its base letter.
fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'ä' | 'â' => 'a',
        'è' | 'é' | 'ë' | 'ê' => 'e',
        'ì' | 'í' | 'ï' | 'î' => 'i',
        'ò' | 'ó' | 'ö' | 'ô' => 'o',
        'ù' | 'ú' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Lowercase and strip diacritics.
pub fn fold_diacritics(s: &str) -> String {
    s.to_lowercase().chars().map(fold_char).collect()
}

/// Normalize a tag name to its semantic equivalent: trimmed, lowercased,
/// diacritics stripped.
pub fn normalize_tag(tag: &str) -> String {
    fold_diacritics(tag.trim())
}

/// Normalize a collection of tag names into a set, dropping empties.
pub fn normalize_tagset<'a>(names: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    names
        .into_iter()
        .map(normalize_tag)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Convert text to a URL-ish slug: lowercased, diacritics folded,
/// punctuation dropped, whitespace/dash runs collapsed to a single dash.
pub fn slugify(text: &str) -> String {
    let folded = fold_diacritics(text);
    let stripped = SLUG_STRIP_RE.replace_all(&folded, "");
    SLUG_DASH_RE
        .replace_all(&stripped, "-")
        .trim_matches('-')
        .to_string()
}

/// Collapse internal whitespace runs and trim.
pub fn collapse_ws(s: &str) -> String {
    WS_RE.replace_all(s.trim(), " ").to_string()
}

/// Lowercased word tokens (letter runs, apostrophes kept).
pub fn tokenize_words(s: &str) -> Vec<String> {
    WORD_RE
        .find_iter(s)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Extract content keywords: lowercase tokens of at least `min_len` chars,
/// punctuation removed, minus the built-in stoplist. Repeats are kept;
/// keyword overlap is computed with multiset semantics.
pub fn extract_keywords(text: &str, min_len: usize) -> Vec<String> {
    let lowercased = text.to_lowercase();
    let cleaned = NON_WORD_RE.replace_all(&lowercased, " ");
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() >= min_len && !KEYWORD_STOPLIST.contains(w))
        .map(|w| w.to_string())
        .collect()
}
