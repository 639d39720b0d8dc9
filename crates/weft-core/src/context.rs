//! Per-run context shared by the scorer, parser, and merge engine.
//!
//! The context replaces module-level caches: it is constructed once by the
//! pipeline driver, owns the loaded stopword set and the reason-quality
//! policy, and is passed by reference into every component that needs them.

use crate::defaults;
use crate::stopwords::Stopwords;
use crate::text::tokenize_words;

/// Bounds for an acceptable connection reason.
#[derive(Debug, Clone, Copy)]
pub struct ReasonPolicy {
    /// Minimum total word count.
    pub min_reason_words: usize,
    /// Maximum total word count.
    pub max_reason_words: usize,
    /// Minimum count of content words (length >= 3, not a stopword).
    pub min_content_words: usize,
}

impl Default for ReasonPolicy {
    fn default() -> Self {
        Self {
            min_reason_words: defaults::MIN_REASON_WORDS,
            max_reason_words: defaults::MAX_REASON_WORDS,
            min_content_words: defaults::MIN_CONTENT_WORDS,
        }
    }
}

/// Run-scoped shared state.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub stopwords: Stopwords,
    pub reason_policy: ReasonPolicy,
}

impl RunContext {
    pub fn new(stopwords: Stopwords, reason_policy: ReasonPolicy) -> Self {
        Self {
            stopwords,
            reason_policy,
        }
    }

    /// Context with no stopwords and default bounds (tests, degraded runs).
    pub fn bare() -> Self {
        Self::default()
    }

    /// Validate a connection reason: total word count within the policy
    /// bounds, and enough content words. Rejects terse, templated, or
    /// stopword-padded reasons.
    pub fn reason_ok(&self, reason: &str) -> bool {
        if reason.is_empty() {
            return false;
        }
        let tokens = tokenize_words(reason);
        let total = tokens.len();
        if total < self.reason_policy.min_reason_words
            || total > self.reason_policy.max_reason_words
        {
            return false;
        }
        let content = tokens
            .iter()
            .filter(|t| t.chars().count() >= 3 && !self.stopwords.contains(t))
            .count();
        content >= self.reason_policy.min_content_words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RunContext {
        RunContext::new(
            Stopwords::from_words(["the", "and", "of", "both", "els", "una"]),
            ReasonPolicy::default(),
        )
    }

    #[test]
    fn test_reason_ok_accepts_substantive() {
        let ctx = ctx();
        assert!(ctx.reason_ok("Both notes discuss deliberate practice applied to learning systems"));
    }

    #[test]
    fn test_reason_too_short_rejected() {
        let ctx = ctx();
        assert!(!ctx.reason_ok("Ethics"));
        assert!(!ctx.reason_ok("Related topics and shared themes"));
    }

    #[test]
    fn test_reason_too_long_rejected() {
        let ctx = ctx();
        let long = "word ".repeat(25);
        assert!(!ctx.reason_ok(&long));
    }

    #[test]
    fn test_stopword_padding_rejected() {
        let ctx = ctx();
        // 8 words total but only 2 content words.
        assert!(!ctx.reason_ok("the and of both els una topics match"));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(!ctx().reason_ok(""));
    }
}
