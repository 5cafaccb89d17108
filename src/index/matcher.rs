//! Multi-pattern alias matching
//!
//! The `AliasMatcher` trait lets different matching strategies be used
//! interchangeably behind a language index:
//!
//! - `AhoCorasickMatcher`: one automaton per language, a single
//!   left-to-right scan reports every occurrence in O(text + matches)
//! - `LinearScanMatcher`: per-pattern substring scan, O(patterns × text);
//!   only suitable for small batch jobs and as a reference in tests
//!
//! Both report *overlapping* occurrences: "hcm" inside "tp.hcm" and
//! "ho chi minh" inside "thanh pho ho chi minh" are all returned.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// One occurrence of a pattern in normalized text (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternHit {
    pub start: usize,
    pub end: usize,
    pub pattern: usize,
}

/// Matching strategy used to build language indexes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    #[default]
    AhoCorasick,
    LinearScan,
}

/// Containment matcher over a fixed pattern set
pub trait AliasMatcher: Send + Sync {
    /// Every occurrence of every pattern in `text`, sorted by position
    fn find_all(&self, text: &str) -> Vec<PatternHit>;

    fn pattern_count(&self) -> usize;

    fn kind(&self) -> MatcherKind;
}

/// Build a matcher of the requested kind over `patterns`
///
/// Patterns must be non-empty; an empty pattern would match everywhere.
pub fn build_matcher(kind: MatcherKind, patterns: Vec<String>) -> Result<Box<dyn AliasMatcher>> {
    if let Some(position) = patterns.iter().position(|p| p.is_empty()) {
        return Err(GatewayError::Integrity(format!(
            "empty pattern at position {}",
            position
        )));
    }

    Ok(match kind {
        MatcherKind::AhoCorasick => Box::new(AhoCorasickMatcher::build(&patterns)?),
        MatcherKind::LinearScan => Box::new(LinearScanMatcher::new(patterns)),
    })
}

/// Aho-Corasick automaton over all aliases of one language
pub struct AhoCorasickMatcher {
    automaton: Option<AhoCorasick>,
    pattern_count: usize,
}

impl AhoCorasickMatcher {
    pub fn build(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self {
                automaton: None,
                pattern_count: 0,
            });
        }

        // Standard semantics are required for overlapping iteration
        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(patterns)
            .map_err(|e| GatewayError::Integrity(format!("failed to build automaton: {}", e)))?;

        Ok(Self {
            automaton: Some(automaton),
            pattern_count: patterns.len(),
        })
    }
}

impl AliasMatcher for AhoCorasickMatcher {
    fn find_all(&self, text: &str) -> Vec<PatternHit> {
        let automaton = match &self.automaton {
            Some(a) => a,
            None => return vec![],
        };

        if text.is_empty() {
            return vec![];
        }

        let mut hits: Vec<PatternHit> = automaton
            .find_overlapping_iter(text)
            .map(|mat| PatternHit {
                start: mat.start(),
                end: mat.end(),
                pattern: mat.pattern().as_usize(),
            })
            .collect();

        hits.sort_unstable();
        hits
    }

    fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    fn kind(&self) -> MatcherKind {
        MatcherKind::AhoCorasick
    }
}

/// Naive per-pattern scan with the same overlapping semantics
pub struct LinearScanMatcher {
    patterns: Vec<String>,
}

impl LinearScanMatcher {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }
}

impl AliasMatcher for LinearScanMatcher {
    fn find_all(&self, text: &str) -> Vec<PatternHit> {
        let mut hits = Vec::new();

        for (pattern, needle) in self.patterns.iter().enumerate() {
            // str::match_indices skips overlapping occurrences, so test every char boundary
            for (start, _) in text.char_indices() {
                if text[start..].starts_with(needle.as_str()) {
                    hits.push(PatternHit {
                        start,
                        end: start + needle.len(),
                        pattern,
                    });
                }
            }
        }

        hits.sort_unstable();
        hits
    }

    fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    fn kind(&self) -> MatcherKind {
        MatcherKind::LinearScan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_overlapping_and_nested_hits() {
        let matcher = AhoCorasickMatcher::build(&patterns(&[
            "thanh pho ho chi minh",
            "ho chi minh",
            "hcm",
            "tp.hcm",
        ]))
        .unwrap();

        let hits = matcher.find_all("thanh pho ho chi minh (tp.hcm)");
        let found: Vec<usize> = hits.iter().map(|h| h.pattern).collect();

        assert_eq!(hits.len(), 4);
        assert!(found.contains(&0));
        assert!(found.contains(&1));
        assert!(found.contains(&2));
        assert!(found.contains(&3));
    }

    #[test]
    fn test_repeated_occurrences() {
        let matcher = AhoCorasickMatcher::build(&patterns(&["aa"])).unwrap();
        let hits = matcher.find_all("aaa");
        assert_eq!(
            hits,
            vec![
                PatternHit {
                    start: 0,
                    end: 2,
                    pattern: 0
                },
                PatternHit {
                    start: 1,
                    end: 3,
                    pattern: 0
                },
            ]
        );
    }

    #[test]
    fn test_alias_in_text_not_text_in_alias() {
        let matcher = AhoCorasickMatcher::build(&patterns(&["ha noi"])).unwrap();
        assert!(matcher.find_all("ha").is_empty());
        assert_eq!(matcher.find_all("ban nha ha noi").len(), 1);
    }

    #[test]
    fn test_unsegmented_scripts() {
        let matcher =
            AhoCorasickMatcher::build(&patterns(&["กรุงเทพ", "東京", "とうきょう"])).unwrap();
        assert_eq!(matcher.find_all("ขายคอนโดกรุงเทพใกล้bts").len(), 1);
        assert_eq!(matcher.find_all("東京都港区").len(), 1);
        assert_eq!(matcher.find_all("とうきょうえき").len(), 1);
    }

    #[test]
    fn test_empty_matcher_and_text() {
        let matcher = AhoCorasickMatcher::build(&[]).unwrap();
        assert_eq!(matcher.pattern_count(), 0);
        assert!(matcher.find_all("anything").is_empty());

        let matcher = AhoCorasickMatcher::build(&patterns(&["x"])).unwrap();
        assert!(matcher.find_all("").is_empty());
    }

    #[test]
    fn test_build_matcher_rejects_empty_pattern() {
        let result = build_matcher(MatcherKind::AhoCorasick, patterns(&["a", ""]));
        assert!(result.is_err());
    }

    #[test]
    fn test_build_matcher_kinds() {
        let ac = build_matcher(MatcherKind::AhoCorasick, patterns(&["a"])).unwrap();
        let linear = build_matcher(MatcherKind::LinearScan, patterns(&["a"])).unwrap();
        assert_eq!(ac.kind(), MatcherKind::AhoCorasick);
        assert_eq!(linear.kind(), MatcherKind::LinearScan);
        assert_eq!(linear.pattern_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_automaton_matches_linear_scan(
            pats in proptest::collection::vec("[abcđ ]{1,4}", 1..8),
            text in "[abcđ ]{0,30}",
        ) {
            let ac = AhoCorasickMatcher::build(&pats).unwrap();
            let linear = LinearScanMatcher::new(pats.clone());
            prop_assert_eq!(ac.find_all(&text), linear.find_all(&text));
        }
    }
}
