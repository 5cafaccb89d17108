//! Immutable gazetteer snapshot with per-language alias automatons
//!
//! A `GazetteerSnapshot` is built once from validated `GazetteerData` and is
//! never mutated afterwards; the engine shares it behind an `Arc` and swaps
//! in a new one on refresh.

use chrono::{DateTime, Utc};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::derive::{apply_district_rules, DistrictAliasRule};
use super::matcher::{build_matcher, AliasMatcher, MatcherKind};
use crate::config::InvalidAliasPolicy;
use crate::error::{GatewayError, Result};
use crate::gazetteer::{EntityId, GazetteerData, LanguageScope, TranslationRow};
use crate::normalize::{
    canonical_language, primary_subtag, NormalizedText, ScriptFamilies, ScriptFamily,
};

/// Level of a matchable administrative division
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Province,
    District,
}

/// A province or district, flattened with its ancestors' codes
#[derive(Debug, Clone)]
pub struct LocationEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub code: String,
    pub name: String,
    pub country_code: String,
    pub province_code: String,
    pub district_code: Option<String>,
    /// Index of the parent province entity (districts only)
    pub parent: Option<usize>,
}

/// An entity owning a pattern, with the alias text as seeded
#[derive(Debug, Clone)]
pub struct AliasOwner {
    pub entity: usize,
    pub alias: String,
}

/// All aliases of one language compiled into a single matcher
pub struct LanguageIndex {
    language: String,
    family: ScriptFamily,
    /// Normalized patterns, positionally aligned with `owners`
    patterns: Vec<String>,
    pattern_lens: Vec<usize>,
    /// Entities sharing a pattern; almost always one
    owners: Vec<SmallVec<[AliasOwner; 2]>>,
    matcher: Box<dyn AliasMatcher>,
}

impl LanguageIndex {
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn family(&self) -> ScriptFamily {
        self.family
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn matcher_kind(&self) -> MatcherKind {
        self.matcher.kind()
    }
}

impl std::fmt::Debug for LanguageIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageIndex")
            .field("language", &self.language)
            .field("family", &self.family)
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

/// One alias occurrence in query text, before deduplication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMatch<'a> {
    pub entity: usize,
    /// Alias as seeded (not normalized)
    pub alias: &'a str,
    /// Length of the normalized alias in characters
    pub alias_len: usize,
    pub language: &'a str,
    /// Byte span in the normalized text
    pub start: usize,
    pub end: usize,
}

/// Everything needed to build a snapshot besides the data itself
#[derive(Clone, Default)]
pub struct SnapshotSettings {
    pub scope: LanguageScope,
    pub families: ScriptFamilies,
    pub district_rules: Vec<DistrictAliasRule>,
    pub invalid_alias_policy: InvalidAliasPolicy,
    pub matcher: MatcherKind,
}

/// A translation excluded from the index under `SkipTranslation`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTranslation {
    pub entity_code: String,
    pub language_code: String,
    pub reason: String,
}

/// Immutable in-memory gazetteer generation
#[derive(Debug)]
pub struct GazetteerSnapshot {
    version: u64,
    hash: String,
    loaded_at: DateTime<Utc>,
    country_count: usize,
    entities: Vec<LocationEntity>,
    by_code: HashMap<String, usize>,
    indexes: BTreeMap<String, LanguageIndex>,
    translation_count: usize,
    derived_aliases: usize,
    skipped: Vec<SkippedTranslation>,
}

#[derive(Default)]
struct IndexBuilder {
    family: Option<ScriptFamily>,
    pattern_at: HashMap<String, usize>,
    patterns: Vec<String>,
    owners: Vec<SmallVec<[AliasOwner; 2]>>,
}

impl IndexBuilder {
    fn add(&mut self, entity: usize, normalized: String, alias: &str) {
        let index = match self.pattern_at.get(&normalized) {
            Some(index) => *index,
            None => {
                self.patterns.push(normalized.clone());
                self.owners.push(SmallVec::new());
                self.pattern_at.insert(normalized, self.patterns.len() - 1);
                self.patterns.len() - 1
            }
        };

        // Two aliases of one entity normalizing alike: keep the first
        let owners = &mut self.owners[index];
        if !owners.iter().any(|o| o.entity == entity) {
            owners.push(AliasOwner {
                entity,
                alias: alias.to_string(),
            });
        }
    }
}

impl GazetteerSnapshot {
    /// Validate `data` and compile it into a snapshot
    ///
    /// Fails with `Integrity` for dangling hierarchy references and, under
    /// `RejectSnapshot`, with `InvalidAliasData` for the first bad translation.
    pub fn build(mut data: GazetteerData, version: u64, settings: &SnapshotSettings) -> Result<Self> {
        let started = std::time::Instant::now();

        data.validate()?;
        data.retain_languages(&settings.scope);
        let hash = data.content_hash();
        let derived_aliases = apply_district_rules(
            &settings.district_rules,
            &mut data,
            &settings.scope,
            &settings.families,
        );

        let country_codes: HashMap<EntityId, &str> = data
            .countries
            .iter()
            .map(|c| (c.id, c.code.as_str()))
            .collect();

        let mut entities = Vec::with_capacity(data.provinces.len() + data.districts.len());
        let mut by_id: HashMap<EntityId, usize> = HashMap::new();

        let mut provinces: Vec<_> = data.provinces.iter().collect();
        provinces.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.code.cmp(&b.code)));

        for province in provinces {
            let country_code = country_codes
                .get(&province.country_id)
                .copied()
                .unwrap_or_default();
            by_id.insert(province.id, entities.len());
            entities.push(LocationEntity {
                id: province.id,
                kind: EntityKind::Province,
                code: province.code.clone(),
                name: province.name.clone(),
                country_code: country_code.to_string(),
                province_code: province.code.clone(),
                district_code: None,
                parent: None,
            });
        }

        for district in &data.districts {
            let parent = by_id.get(&district.province_id).copied().ok_or_else(|| {
                GatewayError::Integrity(format!(
                    "district {} references unknown province",
                    district.code
                ))
            })?;
            let province_code = entities[parent].code.clone();
            let country_code = entities[parent].country_code.clone();

            by_id.insert(district.id, entities.len());
            entities.push(LocationEntity {
                id: district.id,
                kind: EntityKind::District,
                code: district.code.clone(),
                name: district.name.clone(),
                country_code,
                province_code,
                district_code: Some(district.code.clone()),
                parent: Some(parent),
            });
        }

        let by_code = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.code.clone(), i))
            .collect();

        // Deterministic build order: language, then entity code
        let mut translations: Vec<(String, usize, &TranslationRow)> = data
            .translations
            .iter()
            .filter_map(|t| {
                let language = canonical_language(&t.language_code);
                match by_id.get(&t.entity_id) {
                    Some(entity) => Some((language, *entity, t)),
                    None => {
                        // Country translations are not matchable
                        tracing::debug!(entity_id = %t.entity_id, "Ignoring non-matchable translation");
                        None
                    }
                }
            })
            .collect();
        translations.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| entities[a.1].code.cmp(&entities[b.1].code))
        });

        let mut builders: BTreeMap<String, IndexBuilder> = BTreeMap::new();
        let mut skipped = Vec::new();
        let mut translation_count = 0;

        for (language, entity, translation) in translations {
            let family = settings.families.family_for(&language);

            let aliases = match check_translation(translation, family) {
                Ok(aliases) => aliases,
                Err(reason) => {
                    let entity_code = entities[entity].code.clone();
                    match settings.invalid_alias_policy {
                        InvalidAliasPolicy::RejectSnapshot => {
                            return Err(GatewayError::InvalidAliasData {
                                entity_code,
                                language_code: language,
                                reason,
                            });
                        }
                        InvalidAliasPolicy::SkipTranslation => {
                            tracing::warn!(
                                entity = %entity_code,
                                language = %language,
                                reason = %reason,
                                "Skipping translation with invalid aliases"
                            );
                            skipped.push(SkippedTranslation {
                                entity_code,
                                language_code: language,
                                reason,
                            });
                            continue;
                        }
                    }
                }
            };

            let builder = builders.entry(language).or_default();
            builder.family = Some(family);
            for (normalized, alias) in aliases {
                builder.add(entity, normalized, alias);
            }
            translation_count += 1;
        }

        let mut indexes = BTreeMap::new();
        for (language, builder) in builders {
            let family = builder
                .family
                .unwrap_or_else(|| settings.families.family_for(&language));
            let pattern_lens = builder.patterns.iter().map(|p| p.chars().count()).collect();
            let matcher = build_matcher(settings.matcher, builder.patterns.clone())?;

            indexes.insert(
                language.clone(),
                LanguageIndex {
                    language,
                    family,
                    patterns: builder.patterns,
                    pattern_lens,
                    owners: builder.owners,
                    matcher,
                },
            );
        }

        let snapshot = Self {
            version,
            hash,
            loaded_at: Utc::now(),
            country_count: data.countries.len(),
            entities,
            by_code,
            indexes,
            translation_count,
            derived_aliases,
            skipped,
        };

        tracing::info!(
            snapshot_version = version,
            entities = snapshot.entities.len(),
            languages = snapshot.indexes.len(),
            translations = translation_count,
            skipped = snapshot.skipped.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Snapshot built"
        );

        Ok(snapshot)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn entity(&self, index: usize) -> Option<&LocationEntity> {
        self.entities.get(index)
    }

    pub fn entity_by_code(&self, code: &str) -> Option<&LocationEntity> {
        self.by_code.get(code).and_then(|i| self.entities.get(*i))
    }

    /// Languages with at least one indexed alias
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(|l| l.as_str())
    }

    pub fn skipped(&self) -> &[SkippedTranslation] {
        &self.skipped
    }

    /// Indexes to search for the requested languages
    ///
    /// Empty `requested` means every loaded language. A tag with a region
    /// (`ja-JP`) falls back to its primary subtag; unknown tags select nothing.
    pub fn select_languages<S: AsRef<str>>(&self, requested: &[S]) -> Vec<&LanguageIndex> {
        if requested.is_empty() {
            return self.indexes.values().collect();
        }

        let mut selected: Vec<&LanguageIndex> = Vec::new();
        let mut seen = HashSet::new();

        for language in requested {
            let language = canonical_language(language.as_ref());
            let index = self.indexes.get(&language).or_else(|| {
                primary_subtag(&language).and_then(|primary| self.indexes.get(primary))
            });

            match index {
                Some(index) => {
                    if seen.insert(index.language.as_str()) {
                        selected.push(index);
                    }
                }
                None => tracing::debug!(language = %language, "No aliases loaded for language"),
            }
        }

        selected
    }

    /// Every alias occurrence of the requested languages in `text`
    ///
    /// The text is normalized once per script family, so searching several
    /// Latin languages does not redo the work. Hits the family rejects
    /// (word boundaries) are dropped here.
    pub fn find_matches<S: AsRef<str>>(&self, text: &str, languages: &[S]) -> Vec<AliasMatch<'_>> {
        let mut normalized: HashMap<ScriptFamily, NormalizedText> = HashMap::new();
        let mut matches = Vec::new();

        for index in self.select_languages(languages) {
            let haystack = normalized
                .entry(index.family)
                .or_insert_with(|| index.family.normalize(text));

            for hit in index.matcher.find_all(&haystack.text) {
                if !haystack.accepts_span(hit.start, hit.end) {
                    continue;
                }
                for owner in &index.owners[hit.pattern] {
                    matches.push(AliasMatch {
                        entity: owner.entity,
                        alias: &owner.alias,
                        alias_len: index.pattern_lens[hit.pattern],
                        language: &index.language,
                        start: hit.start,
                        end: hit.end,
                    });
                }
            }
        }

        matches
    }

    pub fn stats(&self) -> SnapshotStats {
        let province_count = self
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Province)
            .count();

        SnapshotStats {
            version: self.version,
            hash: self.hash.clone(),
            loaded_at: self.loaded_at,
            country_count: self.country_count,
            province_count,
            district_count: self.entities.len() - province_count,
            translation_count: self.translation_count,
            derived_alias_count: self.derived_aliases,
            languages: self
                .indexes
                .values()
                .map(|index| LanguageStats {
                    language: index.language.clone(),
                    family: index.family,
                    patterns: index.pattern_count(),
                    matcher: index.matcher_kind(),
                })
                .collect(),
            skipped: self.skipped.clone(),
        }
    }
}

/// Normalized aliases of a translation, or why it must be rejected
///
/// The canonical name is indexed after the aliases so a seeded alias with
/// the same normalized form is the one reported.
fn check_translation(
    translation: &TranslationRow,
    family: ScriptFamily,
) -> std::result::Result<Vec<(String, &str)>, String> {
    let normalizer = family.normalizer();

    let canonical = translation.canonical_name.trim();
    if canonical.is_empty() {
        return Err("canonical name is empty".to_string());
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut aliases = Vec::with_capacity(translation.aliases.len() + 1);

    for (position, alias) in translation.aliases.iter().enumerate() {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(format!("alias at position {} is empty", position));
        }
        if !seen.insert(alias) {
            return Err(format!("duplicate alias '{}'", alias));
        }

        let normalized = normalizer.normalize(alias);
        if normalized.is_empty() {
            return Err(format!("alias '{}' is empty after normalization", alias));
        }
        aliases.push((normalized, alias));
    }

    let normalized = normalizer.normalize(canonical);
    if !normalized.is_empty() {
        aliases.push((normalized, canonical));
    }

    Ok(aliases)
}

/// Per-language index statistics
#[derive(Debug, Clone, Serialize)]
pub struct LanguageStats {
    pub language: String,
    pub family: ScriptFamily,
    pub patterns: usize,
    pub matcher: MatcherKind,
}

/// Snapshot statistics
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotStats {
    pub version: u64,
    pub hash: String,
    pub loaded_at: DateTime<Utc>,
    pub country_count: usize,
    pub province_count: usize,
    pub district_count: usize,
    pub translation_count: usize,
    pub derived_alias_count: usize,
    pub languages: Vec<LanguageStats>,
    pub skipped: Vec<SkippedTranslation>,
}

impl std::fmt::Display for SnapshotStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Gazetteer Snapshot Statistics:")?;
        writeln!(f, "  Version: {}", self.version)?;
        writeln!(f, "  Hash: {}", self.hash.get(..16).unwrap_or(&self.hash))?;
        writeln!(f, "  Loaded at: {}", self.loaded_at.to_rfc3339())?;
        writeln!(f, "  Countries: {}", self.country_count)?;
        writeln!(f, "  Provinces: {}", self.province_count)?;
        writeln!(f, "  Districts: {}", self.district_count)?;
        writeln!(f, "  Translations: {}", self.translation_count)?;
        writeln!(f, "  Derived district aliases: {}", self.derived_alias_count)?;
        for language in &self.languages {
            writeln!(
                f,
                "  [{}] {} patterns ({})",
                language.language, language.patterns, language.family
            )?;
        }
        if !self.skipped.is_empty() {
            writeln!(f, "  Skipped translations: {}", self.skipped.len())?;
            for skipped in &self.skipped {
                writeln!(
                    f,
                    "    {}/{}: {}",
                    skipped.entity_code, skipped.language_code, skipped.reason
                )?;
            }
        }
        Ok(())
    }
}
