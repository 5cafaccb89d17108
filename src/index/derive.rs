//! District alias derivation from district codes
//!
//! Listings often refer to districts by their short administrative code
//! ("Q7", "Q.1"). Instead of rewriting the query, a per-country rule turns
//! the last segment of each district code into extra aliases when the
//! snapshot is built, so the matcher sees them like any seeded alias.

use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::config::DistrictAliasRuleConfig;
use crate::error::{GatewayError, Result};
use crate::gazetteer::{GazetteerData, LanguageScope, TranslationRow};
use crate::normalize::{canonical_language, ScriptFamilies};

/// A compiled district alias rule
#[derive(Debug, Clone)]
pub struct DistrictAliasRule {
    country: String,
    language: String,
    pattern: Regex,
    templates: Vec<String>,
}

impl DistrictAliasRule {
    pub fn new(
        country: impl Into<String>,
        language: impl Into<String>,
        code_pattern: &str,
        templates: Vec<String>,
    ) -> Result<Self> {
        let pattern = Regex::new(code_pattern).map_err(|e| {
            GatewayError::Config(format!("invalid district code pattern '{}': {}", code_pattern, e))
        })?;

        Ok(Self {
            country: country.into().to_uppercase(),
            language: canonical_language(&language.into()),
            pattern,
            templates,
        })
    }

    pub fn from_config(config: &DistrictAliasRuleConfig) -> Result<Self> {
        Self::new(
            config.country.clone(),
            config.language.clone(),
            &config.code_pattern,
            config.templates.clone(),
        )
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Aliases for a district code, empty when the pattern does not match
    ///
    /// Only the segment after the last `_` is matched: `VN_HCMC_Q7` → `Q7`.
    pub fn derive(&self, district_code: &str) -> Vec<String> {
        let local = district_code
            .rsplit_once('_')
            .map(|(_, tail)| tail)
            .unwrap_or(district_code);

        let Some(caps) = self.pattern.captures(local) else {
            return vec![];
        };

        self.templates
            .iter()
            .map(|template| {
                let mut alias = template.clone();
                for (i, group) in caps.iter().enumerate() {
                    let value = group.map(|m| m.as_str()).unwrap_or("");
                    alias = alias.replace(&format!("{{{}}}", i), value);
                }
                alias
            })
            .filter(|alias| !alias.trim().is_empty())
            .collect()
    }
}

/// Add derived aliases to `data`, returning how many were added
///
/// A derived alias lands in the district's translation for the rule's
/// language, which is created (named after the district) when missing.
/// A derived alias is skipped when an alias of that translation already
/// normalizes to the same form under the language's script family, so
/// derivation never introduces a duplicate.
pub fn apply_district_rules(
    rules: &[DistrictAliasRule],
    data: &mut GazetteerData,
    scope: &LanguageScope,
    families: &ScriptFamilies,
) -> usize {
    if rules.is_empty() {
        return 0;
    }

    let country_codes: HashMap<_, _> = data
        .countries
        .iter()
        .map(|c| (c.id, c.code.to_uppercase()))
        .collect();

    let mut translation_at: HashMap<(uuid::Uuid, String), usize> = data
        .translations
        .iter()
        .enumerate()
        .map(|(i, t)| ((t.entity_id, canonical_language(&t.language_code)), i))
        .collect();

    let mut added = 0;

    for district in &data.districts {
        let Some(country_code) = country_codes.get(&district.country_id) else {
            continue;
        };

        for rule in rules {
            if &rule.country != country_code || !scope.includes(&rule.language) {
                continue;
            }

            let derived = rule.derive(&district.code);
            if derived.is_empty() {
                continue;
            }

            let key = (district.id, rule.language.clone());
            let index = match translation_at.get(&key) {
                Some(index) => *index,
                None => {
                    data.translations.push(TranslationRow {
                        entity_id: district.id,
                        language_code: rule.language.clone(),
                        canonical_name: district.name.clone(),
                        aliases: vec![],
                    });
                    let index = data.translations.len() - 1;
                    translation_at.insert(key, index);
                    index
                }
            };

            let family = families.family_for(&rule.language);
            let translation = &mut data.translations[index];
            let mut existing: HashSet<String> = translation
                .aliases
                .iter()
                .map(|alias| family.normalize(alias).text)
                .collect();

            for alias in derived {
                let normalized = family.normalize(&alias);
                if normalized.is_empty() || !existing.insert(normalized.text) {
                    continue;
                }
                translation.aliases.push(alias);
                added += 1;
            }
        }
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::SeedFile;

    fn quan_rule() -> DistrictAliasRule {
        DistrictAliasRule::new(
            "vn",
            "vi",
            r"^Q(\d+)$",
            vec!["quận {1}".to_string(), "q{1}".to_string(), "q.{1}".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_derive_from_code_tail() {
        let rule = quan_rule();
        assert_eq!(rule.derive("VN_HCMC_Q7"), vec!["quận 7", "q7", "q.7"]);
        assert_eq!(rule.derive("Q12"), vec!["quận 12", "q12", "q.12"]);
        assert!(rule.derive("VN_HCMC_THU_DUC").is_empty());
        assert_eq!(rule.country(), "VN");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = DistrictAliasRule::new("VN", "vi", "^Q(", vec!["x".to_string()]).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn test_apply_rules() {
        let mut data = SeedFile::from_yaml(
            r#"
countries:
  - code: VN
    name: Vietnam
    provinces:
      - code: VN_HCMC
        name: Ho Chi Minh City
        districts:
          - code: VN_HCMC_Q1
            name: District 1
            translations:
              vi:
                name: Quận 1
                aliases: [quận 1]
          - code: VN_HCMC_Q7
            name: District 7
  - code: TH
    name: Thailand
    provinces:
      - code: TH_BANGKOK
        name: Bangkok
        districts:
          - code: TH_BANGKOK_Q1
            name: Not Vietnamese
"#,
        )
        .unwrap()
        .into_data();

        let added = apply_district_rules(
            &[quan_rule()],
            &mut data,
            &LanguageScope::All,
            &ScriptFamilies::default(),
        );

        // Q1 already had "quận 1", so only q1 and q.1 are new; Q7 gets all three
        assert_eq!(added, 5);

        let q7 = data
            .translations
            .iter()
            .find(|t| t.canonical_name == "District 7")
            .unwrap();
        assert_eq!(q7.language_code, "vi");
        assert_eq!(q7.aliases, vec!["quận 7", "q7", "q.7"]);

        assert!(!data
            .translations
            .iter()
            .any(|t| t.canonical_name == "Not Vietnamese"));
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_apply_rules_out_of_scope() {
        let mut data = GazetteerData::default();
        let added = apply_district_rules(
            &[quan_rule()],
            &mut data,
            &LanguageScope::from_languages(["ja"]),
            &ScriptFamilies::default(),
        );
        assert_eq!(added, 0);
    }

    #[test]
    fn test_derived_alias_matching_padded_seed_alias_is_skipped() {
        let mut data = SeedFile::from_yaml(
            r#"
countries:
  - code: VN
    name: Vietnam
    provinces:
      - code: VN_HCMC
        name: Ho Chi Minh City
        districts:
          - code: VN_HCMC_Q1
            name: District 1
            translations:
              vi:
                name: Quận 1
                aliases: ["Quận 1", "q1 "]
"#,
        )
        .unwrap()
        .into_data();

        let added = apply_district_rules(
            &[quan_rule()],
            &mut data,
            &LanguageScope::All,
            &ScriptFamilies::default(),
        );

        // "quận 1" and "q1" already exist modulo case and padding
        assert_eq!(added, 1);
        assert_eq!(data.translations[0].aliases, vec!["Quận 1", "q1 ", "q.1"]);
    }
}
