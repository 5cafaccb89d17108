//! Per-family normalizer implementations

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::{ScriptFamily, TextNormalizer};

/// Collapse runs of whitespace into a single space and trim the ends
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Latin-with-diacritics normalizer (vi, id, fil, en, ...)
///
/// - Unicode NFKC fold
/// - Lowercase conversion
/// - Strip combining marks ("Hồ Chí Minh" → "ho chi minh")
/// - Map stroked letters that carry no combining mark (`đ` → `d`)
/// - Whitespace collapsing
///
/// Punctuation is kept: "TP.HCM" normalizes to "tp.hcm" on both sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatinNormalizer;

impl TextNormalizer for LatinNormalizer {
    fn family(&self) -> ScriptFamily {
        ScriptFamily::LatinDiacritic
    }

    fn normalize(&self, input: &str) -> String {
        let folded = input.nfkc().collect::<String>().to_lowercase();

        let stripped: String = folded
            .nfd()
            .filter(|c| !is_combining_mark(*c))
            .map(fold_stroked_letter)
            .collect();

        // Recompose so scripts decomposed by NFD (e.g. Hangul) round-trip
        collapse_whitespace(&stripped.nfc().collect::<String>())
    }
}

fn fold_stroked_letter(c: char) -> char {
    match c {
        'đ' | 'ð' => 'd',
        'ł' => 'l',
        'ø' => 'o',
        'ħ' => 'h',
        c => c,
    }
}

/// CJK normalizer (ja, zh, ko)
///
/// Ideographs and kana have no case and no diacritics to strip, so they
/// pass through. NFKC turns full-width Romaji ("Ｔｏｋｙｏ") and half-width
/// katakana into their standard forms; lowercasing then only affects Romaji.
#[derive(Debug, Clone, Copy, Default)]
pub struct CjkNormalizer;

impl TextNormalizer for CjkNormalizer {
    fn family(&self) -> ScriptFamily {
        ScriptFamily::Cjk
    }

    fn normalize(&self, input: &str) -> String {
        let folded = input.nfkc().collect::<String>().to_lowercase();
        collapse_whitespace(&folded)
    }
}

/// Normalizer for scripts without case (th, km, lo, my)
///
/// Script characters pass through unchanged; only whitespace is collapsed.
/// Characters that do have case (Latin proxy aliases such as "Siem Reap"
/// filed under `km`) are lowercased so they match regardless of casing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaselessNormalizer;

impl TextNormalizer for CaselessNormalizer {
    fn family(&self) -> ScriptFamily {
        ScriptFamily::Caseless
    }

    fn normalize(&self, input: &str) -> String {
        let folded: String = input
            .chars()
            .flat_map(|c| {
                let lower: Vec<char> = if c.is_uppercase() {
                    c.to_lowercase().collect()
                } else {
                    vec![c]
                };
                lower
            })
            .collect();
        collapse_whitespace(&folded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_latin_case_and_diacritics() {
        let n = LatinNormalizer;
        assert_eq!(n.normalize("Hà Nội"), "ha noi");
        assert_eq!(n.normalize("HA NOI"), "ha noi");
        assert_eq!(n.normalize("hà nội"), "ha noi");
        assert_eq!(n.normalize("Thành phố Hồ Chí Minh"), "thanh pho ho chi minh");
    }

    #[test]
    fn test_latin_stroked_d() {
        let n = LatinNormalizer;
        assert_eq!(n.normalize("Đà Nẵng"), "da nang");
        assert_eq!(n.normalize("BĐS"), "bds");
    }

    #[test]
    fn test_latin_keeps_punctuation() {
        let n = LatinNormalizer;
        assert_eq!(n.normalize("TP.HCM"), "tp.hcm");
        assert_eq!(n.normalize("Sài Gòn, Q.1"), "sai gon, q.1");
    }

    #[test]
    fn test_latin_whitespace_collapse() {
        let n = LatinNormalizer;
        assert_eq!(n.normalize("  Jakarta \t Selatan\n"), "jakarta selatan");
    }

    #[test]
    fn test_latin_full_width() {
        let n = LatinNormalizer;
        assert_eq!(n.normalize("Ｂａｌｉ"), "bali");
    }

    #[test]
    fn test_cjk_passes_ideographs_and_kana() {
        let n = CjkNormalizer;
        assert_eq!(n.normalize("東京都"), "東京都");
        assert_eq!(n.normalize("とうきょう"), "とうきょう");
        assert_eq!(n.normalize("トウキョウ"), "トウキョウ");
    }

    #[test]
    fn test_cjk_folds_romaji() {
        let n = CjkNormalizer;
        assert_eq!(n.normalize("Tokyo"), "tokyo");
        assert_eq!(n.normalize("Ｔｏｋｙｏ"), "tokyo");
        assert_eq!(n.normalize("東京 Tokyo"), "東京 tokyo");
    }

    #[test]
    fn test_cjk_half_width_katakana() {
        let n = CjkNormalizer;
        assert_eq!(n.normalize("ﾄｳｷｮｳ"), "トウキョウ");
    }

    #[test]
    fn test_caseless_passthrough() {
        let n = CaselessNormalizer;
        assert_eq!(n.normalize("กรุงเทพมหานคร"), "กรุงเทพมหานคร");
        assert_eq!(n.normalize("សៀមរាប"), "សៀមរាប");
        assert_eq!(n.normalize("  ខេត្ត   សៀមរាប "), "ខេត្ត សៀមរាប");
    }

    #[test]
    fn test_caseless_lowercases_latin_proxy() {
        let n = CaselessNormalizer;
        assert_eq!(n.normalize("Siem Reap"), "siem reap");
        assert_eq!(n.normalize("SIEM REAP"), "siem reap");
    }

    proptest! {
        #[test]
        fn prop_latin_idempotent(s in "[a-zA-Z0-9àáạảãâầấậẩẫăằắặẳẵèéẹẻẽêềếệểễìíịỉĩòóọỏõôồốộổỗơờớợởỡùúụủũưừứựửữỳýỵỷỹđĐÀÉÔƯ .,\t\n]{0,40}") {
            let n = LatinNormalizer;
            let once = n.normalize(&s);
            prop_assert_eq!(n.normalize(&once), once);
        }

        #[test]
        fn prop_cjk_idempotent(s in "[a-zA-Z東京都大阪府とうきょうおおさかトウキョウＴｏｋｙｏﾄｳｷｮ \t]{0,30}") {
            let n = CjkNormalizer;
            let once = n.normalize(&s);
            prop_assert_eq!(n.normalize(&once), once);
        }

        #[test]
        fn prop_caseless_idempotent(s in "[a-zA-Zกรุงเทพมหานครเชียงใหม่សៀមរាបភ្នំពេញ \t]{0,30}") {
            let n = CaselessNormalizer;
            let once = n.normalize(&s);
            prop_assert_eq!(n.normalize(&once), once);
        }
    }
}
