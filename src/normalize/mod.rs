//! Script-aware text normalization
//!
//! Aliases are normalized once when a snapshot is built and query text is
//! normalized at match time with the same normalizer, chosen by the
//! language tag. Every normalizer is idempotent, so an alias and the text
//! it appears in always land in the same canonical form.
//!
//! Script families:
//! - `LatinDiacritic`: Vietnamese, Indonesian, Filipino, English, ...
//! - `Cjk`: Japanese (Kanji, Hiragana, Katakana, Romaji), Chinese, Korean
//! - `Caseless`: Thai, Khmer, Lao, Burmese

mod scripts;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use scripts::{collapse_whitespace, CaselessNormalizer, CjkNormalizer, LatinNormalizer};

/// A grouping of writing systems sharing normalization semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptFamily {
    /// Latin script with diacritics: case-fold, strip marks, collapse whitespace
    LatinDiacritic,
    /// Ideographs and kana pass through; Romaji is case-folded
    Cjk,
    /// Scripts without case or word-boundary whitespace
    Caseless,
}

impl ScriptFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptFamily::LatinDiacritic => "latin_diacritic",
            ScriptFamily::Cjk => "cjk",
            ScriptFamily::Caseless => "caseless",
        }
    }

    /// The normalizer implementing this family's rules
    pub fn normalizer(&self) -> &'static dyn TextNormalizer {
        match self {
            ScriptFamily::LatinDiacritic => &LatinNormalizer,
            ScriptFamily::Cjk => &CjkNormalizer,
            ScriptFamily::Caseless => &CaselessNormalizer,
        }
    }

    /// Normalize `input` and tag it with this family
    pub fn normalize(&self, input: &str) -> NormalizedText {
        NormalizedText {
            text: self.normalizer().normalize(input),
            family: *self,
        }
    }
}

impl std::fmt::Display for ScriptFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized text tagged with the family that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub family: ScriptFamily,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether a match at byte span `start..end` is acceptable for this family
    pub fn accepts_span(&self, start: usize, end: usize) -> bool {
        !self.family.normalizer().requires_word_boundaries()
            || on_word_boundaries(&self.text, start, end)
    }
}

/// Whether `start..end` is neither preceded nor followed by an alphanumeric char
pub fn on_word_boundaries(text: &str, start: usize, end: usize) -> bool {
    let before = text
        .get(..start)
        .and_then(|s| s.chars().next_back())
        .map_or(false, char::is_alphanumeric);
    let after = text
        .get(end..)
        .and_then(|s| s.chars().next())
        .map_or(false, char::is_alphanumeric);
    !before && !after
}

/// Canonicalization rules for one script family
///
/// Implementations must be idempotent: `normalize(normalize(s)) == normalize(s)`.
pub trait TextNormalizer: Send + Sync {
    /// The family this normalizer implements
    fn family(&self) -> ScriptFamily;

    /// Produce the canonical matching form of `input`
    fn normalize(&self, input: &str) -> String;

    /// Whether matches must fall on word boundaries.
    ///
    /// No current family requires it: Latin aliases can sit inside compound
    /// words in listings, and CJK/caseless scripts have no separators.
    fn requires_word_boundaries(&self) -> bool {
        false
    }
}

/// Built-in language → family assignments
const DEFAULT_FAMILIES: &[(&str, ScriptFamily)] = &[
    ("vi", ScriptFamily::LatinDiacritic),
    ("id", ScriptFamily::LatinDiacritic),
    ("ms", ScriptFamily::LatinDiacritic),
    ("fil", ScriptFamily::LatinDiacritic),
    ("tl", ScriptFamily::LatinDiacritic),
    ("en", ScriptFamily::LatinDiacritic),
    ("ja", ScriptFamily::Cjk),
    ("zh", ScriptFamily::Cjk),
    ("ko", ScriptFamily::Cjk),
    ("th", ScriptFamily::Caseless),
    ("km", ScriptFamily::Caseless),
    ("lo", ScriptFamily::Caseless),
    ("my", ScriptFamily::Caseless),
];

/// Language tag → script family mapping with configurable overrides
///
/// Unknown languages fall back to `LatinDiacritic`.
#[derive(Debug, Clone)]
pub struct ScriptFamilies {
    families: HashMap<String, ScriptFamily>,
}

impl Default for ScriptFamilies {
    fn default() -> Self {
        Self {
            families: DEFAULT_FAMILIES
                .iter()
                .map(|(lang, family)| (lang.to_string(), *family))
                .collect(),
        }
    }
}

impl ScriptFamilies {
    /// Defaults plus the given overrides (overrides win)
    pub fn with_overrides(overrides: &HashMap<String, ScriptFamily>) -> Self {
        let mut families = Self::default();
        for (lang, family) in overrides {
            families.families.insert(canonical_language(lang), *family);
        }
        families
    }

    /// Family for a language tag; `ja-JP` falls back to `ja`
    pub fn family_for(&self, language: &str) -> ScriptFamily {
        let lang = canonical_language(language);
        if let Some(family) = self.families.get(&lang) {
            return *family;
        }
        primary_subtag(&lang)
            .and_then(|primary| self.families.get(primary))
            .copied()
            .unwrap_or(ScriptFamily::LatinDiacritic)
    }

    /// Normalize `input` with the rules of `language`'s family
    pub fn normalize(&self, language: &str, input: &str) -> NormalizedText {
        self.family_for(language).normalize(input)
    }
}

/// Lowercase, trimmed language tag with `_` separators turned into `-`
pub fn canonical_language(language: &str) -> String {
    language.trim().to_lowercase().replace('_', "-")
}

/// The primary subtag of a BCP 47-ish tag (`ja` for `ja-jp`)
pub fn primary_subtag(language: &str) -> Option<&str> {
    language.split_once('-').map(|(primary, _)| primary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_families() {
        let families = ScriptFamilies::default();
        assert_eq!(families.family_for("vi"), ScriptFamily::LatinDiacritic);
        assert_eq!(families.family_for("ja"), ScriptFamily::Cjk);
        assert_eq!(families.family_for("km"), ScriptFamily::Caseless);
        assert_eq!(families.family_for("th"), ScriptFamily::Caseless);
    }

    #[test]
    fn test_region_subtag_falls_back_to_primary() {
        let families = ScriptFamilies::default();
        assert_eq!(families.family_for("ja-JP"), ScriptFamily::Cjk);
        assert_eq!(families.family_for("th_TH"), ScriptFamily::Caseless);
    }

    #[test]
    fn test_unknown_language_is_latin() {
        let families = ScriptFamilies::default();
        assert_eq!(families.family_for("xx"), ScriptFamily::LatinDiacritic);
    }

    #[test]
    fn test_overrides_win() {
        let overrides = HashMap::from([("JA".to_string(), ScriptFamily::LatinDiacritic)]);
        let families = ScriptFamilies::with_overrides(&overrides);
        assert_eq!(families.family_for("ja"), ScriptFamily::LatinDiacritic);
        assert_eq!(families.family_for("km"), ScriptFamily::Caseless);
    }

    #[test]
    fn test_normalize_tags_family() {
        let families = ScriptFamilies::default();
        let normalized = families.normalize("vi", "  Hà   Nội ");
        assert_eq!(normalized.text, "ha noi");
        assert_eq!(normalized.family, ScriptFamily::LatinDiacritic);
        assert!(!normalized.is_empty());

        let normalized = families.normalize("km", "Siem Reap");
        assert_eq!(normalized.family, ScriptFamily::Caseless);
    }

    #[test]
    fn test_no_family_requires_word_boundaries() {
        for family in [
            ScriptFamily::LatinDiacritic,
            ScriptFamily::Cjk,
            ScriptFamily::Caseless,
        ] {
            assert!(!family.normalizer().requires_word_boundaries());
            assert_eq!(family.normalizer().family(), family);

            // Mid-word spans are accepted when boundaries are not required
            let normalized = family.normalize("xhanoix");
            assert!(normalized.accepts_span(1, 6));
        }
    }

    #[test]
    fn test_on_word_boundaries() {
        let text = "ban nha ha noi, q7";
        assert!(on_word_boundaries(text, 8, 14));
        assert!(on_word_boundaries(text, 16, 18));
        assert!(!on_word_boundaries(text, 9, 14));
        assert!(!on_word_boundaries(text, 8, 13));
    }
}
