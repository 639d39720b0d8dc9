//! Edge evidence classification.
//!
//! Every edge carries the set of signal categories supporting it. The set is
//! closed: merge and styling logic match exhaustively over the variants
//! instead of comparing loose strings.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single category of signal supporting a connection.
///
/// Variant order matches the alphabetical order of the wire names, so an
/// ordered set of variants serializes in the same deterministic order the
/// graph format has always used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Evidence {
    /// AI-judged conceptual connection.
    #[serde(rename = "ai")]
    Ai,
    /// Author-created reference link.
    #[serde(rename = "explicit")]
    Explicit,
    /// Membership edge from a note to a tag pseudo-node.
    #[serde(rename = "tag")]
    TagMembership,
    /// Tag coincidence backing another signal.
    #[serde(rename = "tags")]
    Tags,
    /// Connection inferred purely from shared tags.
    #[serde(rename = "tags_inferred")]
    TagsInferred,
}

impl Evidence {
    /// Wire name of the evidence category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Evidence::Ai => "ai",
            Evidence::Explicit => "explicit",
            Evidence::TagMembership => "tag",
            Evidence::Tags => "tags",
            Evidence::TagsInferred => "tags_inferred",
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Evidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ai" => Ok(Evidence::Ai),
            "explicit" => Ok(Evidence::Explicit),
            "tag" => Ok(Evidence::TagMembership),
            "tags" => Ok(Evidence::Tags),
            "tags_inferred" => Ok(Evidence::TagsInferred),
            other => Err(format!("unknown evidence category: {}", other)),
        }
    }
}

/// An ordered, deduplicated set of evidence categories.
///
/// Serializes as a sorted list of wire names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceSet(BTreeSet<Evidence>);

impl EvidenceSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set containing exactly one category.
    pub fn only(ev: Evidence) -> Self {
        let mut set = BTreeSet::new();
        set.insert(ev);
        Self(set)
    }

    pub fn insert(&mut self, ev: Evidence) {
        self.0.insert(ev);
    }

    pub fn contains(&self, ev: Evidence) -> bool {
        self.0.contains(&ev)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True iff the set is exactly `{ev}`.
    pub fn is_only(&self, ev: Evidence) -> bool {
        self.0.len() == 1 && self.0.contains(&ev)
    }

    /// Union the other set into this one.
    pub fn union_with(&mut self, other: &EvidenceSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn iter(&self) -> impl Iterator<Item = Evidence> + '_ {
        self.0.iter().copied()
    }

    /// Lenient construction from wire strings; unknown names are skipped.
    /// Used when ingesting externally produced edge records.
    pub fn parse_lenient<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = BTreeSet::new();
        for name in names {
            if let Ok(ev) = name.parse::<Evidence>() {
                set.insert(ev);
            }
        }
        Self(set)
    }
}

impl FromIterator<Evidence> for EvidenceSet {
    fn from_iter<I: IntoIterator<Item = Evidence>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_roundtrip() {
        for ev in [
            Evidence::Ai,
            Evidence::Explicit,
            Evidence::TagMembership,
            Evidence::Tags,
            Evidence::TagsInferred,
        ] {
            assert_eq!(ev.as_str().parse::<Evidence>().unwrap(), ev);
        }
    }

    #[test]
    fn test_serialized_order_is_alphabetical() {
        let set: EvidenceSet = [Evidence::TagsInferred, Evidence::Explicit, Evidence::Ai]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["ai","explicit","tags_inferred"]"#);
    }

    #[test]
    fn test_is_only() {
        let ai = EvidenceSet::only(Evidence::Ai);
        assert!(ai.is_only(Evidence::Ai));

        let mut mixed = ai.clone();
        mixed.insert(Evidence::Explicit);
        assert!(!mixed.is_only(Evidence::Ai));
        assert!(!EvidenceSet::new().is_only(Evidence::Ai));
    }

    #[test]
    fn test_union_with() {
        let mut a = EvidenceSet::only(Evidence::Ai);
        let b = EvidenceSet::only(Evidence::Tags);
        a.union_with(&b);
        assert_eq!(a.len(), 2);
        assert!(a.contains(Evidence::Ai));
        assert!(a.contains(Evidence::Tags));
    }

    #[test]
    fn test_parse_lenient_skips_unknown() {
        let set = EvidenceSet::parse_lenient(["ai", "bogus", "explicit", ""]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Evidence::Ai));
        assert!(set.contains(Evidence::Explicit));
    }
}
