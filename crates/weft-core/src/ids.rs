//! Node identifier handling: note UUIDs and tag pseudo-node ids.
//!
//! Graph node ids come in two shapes:
//!
//! - a dashed lowercase UUID for real notes (`8-4-4-4-12` hex groups);
//!   upstream sources sometimes hand back 32-hex undashed or braced forms,
//!   which [`normalize_uuid`] re-dashes;
//! - a reserved `tag::<slug>` id for synthetic tag-grouping nodes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix reserved for synthetic tag-grouping pseudo-nodes.
pub const TAG_NODE_PREFIX: &str = "tag::";

/// Anchored canonical UUID pattern (dashed, case-insensitive).
pub static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("static uuid regex")
});

/// Unanchored UUID pattern, for scanning free text.
pub static UUID_SEARCH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("static uuid search regex")
});

static HEX32_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{32}$").expect("static hex32 regex"));

/// Normalize a UUID string (with or without dashes, possibly braced) to
/// dashed lowercase format. Strings that are not UUID-shaped pass through
/// lowercased and trimmed; validation is a separate concern.
pub fn normalize_uuid(raw: &str) -> String {
    let s = raw
        .to_lowercase()
        .replace(['{', '}'], "")
        .trim()
        .to_string();
    if s.contains('-') {
        return s;
    }
    if HEX32_RE.is_match(&s) {
        return format!(
            "{}-{}-{}-{}-{}",
            &s[0..8],
            &s[8..12],
            &s[12..16],
            &s[16..20],
            &s[20..32]
        );
    }
    s
}

/// Whether `id` is a syntactically valid graph node id: a canonical UUID
/// or a `tag::` pseudo-node.
pub fn is_valid_node_id(id: &str) -> bool {
    if id.starts_with(TAG_NODE_PREFIX) {
        return true;
    }
    UUID_RE.is_match(id)
}

/// Build the pseudo-node id for a tag name.
pub fn tag_node_id(name: &str) -> String {
    format!(
        "{}{}",
        TAG_NODE_PREFIX,
        name.trim().to_lowercase().replace(' ', "-")
    )
}
