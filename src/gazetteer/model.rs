//! Gazetteer rows: countries, provinces, districts, and translations
//!
//! `GazetteerData` is the raw, store-shaped content of one snapshot. It is
//! validated for hierarchy integrity before any index is built from it and
//! can be persisted to disk with bincode for fast cold starts.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use uuid::Uuid;

use crate::error::{GatewayError, Result};

/// Type alias for gazetteer row IDs
pub type EntityId = Uuid;

/// Compiled snapshot file format version - increment when row layout changes
pub const DATA_FORMAT_VERSION: u32 = 1;

/// Root of the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRow {
    pub id: EntityId,
    /// ISO-like code (e.g., "VN", "JP")
    pub code: String,
    pub name: String,
}

/// First-level division (province, prefecture, state)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceRow {
    pub id: EntityId,
    /// Globally unique code (e.g., "VN_HANOI")
    pub code: String,
    pub country_id: EntityId,
    /// Canonical English name
    pub name: String,
    pub sort_order: i32,
}

/// Second-level division, only populated for some provinces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictRow {
    pub id: EntityId,
    pub code: String,
    pub country_id: EntityId,
    pub province_id: EntityId,
    pub name: String,
}

/// Localized name and alias set for one (entity, language) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRow {
    pub entity_id: EntityId,
    pub language_code: String,
    pub canonical_name: String,
    /// Ordered alias list (colloquial, historic, proxy-city, abbreviations)
    pub aliases: Vec<String>,
}

/// Which languages a snapshot load should include
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LanguageScope {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl LanguageScope {
    /// Scope from a configured language list; empty means all
    pub fn from_languages<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = languages
            .into_iter()
            .map(|l| crate::normalize::canonical_language(l.as_ref()))
            .filter(|l| !l.is_empty())
            .collect();

        if set.is_empty() {
            LanguageScope::All
        } else {
            LanguageScope::Only(set)
        }
    }

    pub fn includes(&self, language: &str) -> bool {
        match self {
            LanguageScope::All => true,
            LanguageScope::Only(set) => {
                set.contains(&crate::normalize::canonical_language(language))
            }
        }
    }

    /// Explicit language list, if scoped
    pub fn languages(&self) -> Option<Vec<String>> {
        match self {
            LanguageScope::All => None,
            LanguageScope::Only(set) => Some(set.iter().cloned().collect()),
        }
    }
}

/// The full content of one gazetteer generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazetteerData {
    pub countries: Vec<CountryRow>,
    pub provinces: Vec<ProvinceRow>,
    pub districts: Vec<DistrictRow>,
    pub translations: Vec<TranslationRow>,
}

#[derive(Serialize, Deserialize)]
struct DataFile {
    version: u32,
    data: GazetteerData,
}

impl GazetteerData {
    /// Drop translations outside `scope`
    pub fn retain_languages(&mut self, scope: &LanguageScope) {
        if let LanguageScope::Only(_) = scope {
            self.translations
                .retain(|t| scope.includes(&t.language_code));
        }
    }

    /// Check foreign-key style integrity of the hierarchy.
    ///
    /// - codes are unique per level and ids unique overall
    /// - every province references an existing country
    /// - every district references an existing province, and its country
    ///   matches the province's country
    /// - `(entity_id, language_code)` is unique and references a row
    pub fn validate(&self) -> Result<()> {
        let mut ids: HashSet<EntityId> = HashSet::new();
        let mut country_codes: HashSet<&str> = HashSet::new();
        for country in &self.countries {
            if !ids.insert(country.id) || !country_codes.insert(country.code.as_str()) {
                return Err(GatewayError::Integrity(format!(
                    "duplicate country {}",
                    country.code
                )));
            }
        }
        let country_ids = ids.clone();

        let mut province_country: HashMap<EntityId, EntityId> = HashMap::new();
        let mut entity_codes: HashSet<&str> = HashSet::new();
        for province in &self.provinces {
            if !country_ids.contains(&province.country_id) {
                return Err(GatewayError::Integrity(format!(
                    "province {} references missing country {}",
                    province.code, province.country_id
                )));
            }
            if !ids.insert(province.id) || !entity_codes.insert(province.code.as_str()) {
                return Err(GatewayError::Integrity(format!(
                    "duplicate province {}",
                    province.code
                )));
            }
            province_country.insert(province.id, province.country_id);
        }

        for district in &self.districts {
            match province_country.get(&district.province_id) {
                None => {
                    return Err(GatewayError::Integrity(format!(
                        "district {} references missing province {}",
                        district.code, district.province_id
                    )))
                }
                Some(country_id) if *country_id != district.country_id => {
                    return Err(GatewayError::Integrity(format!(
                        "district {} country does not match its province's country",
                        district.code
                    )))
                }
                Some(_) => {}
            }
            if !ids.insert(district.id) || !entity_codes.insert(district.code.as_str()) {
                return Err(GatewayError::Integrity(format!(
                    "duplicate district {}",
                    district.code
                )));
            }
        }

        let mut translation_keys: HashSet<(EntityId, String)> = HashSet::new();
        for translation in &self.translations {
            if !ids.contains(&translation.entity_id) {
                return Err(GatewayError::Integrity(format!(
                    "translation {}/{} references missing entity",
                    translation.entity_id, translation.language_code
                )));
            }
            let key = (
                translation.entity_id,
                crate::normalize::canonical_language(&translation.language_code),
            );
            if !translation_keys.insert(key) {
                return Err(GatewayError::Integrity(format!(
                    "duplicate translation {}/{}",
                    translation.entity_id, translation.language_code
                )));
            }
        }

        Ok(())
    }

    /// Content-based SHA-256 hash, independent of row order
    pub fn content_hash(&self) -> String {
        let mut sorted = self.clone();
        sorted.countries.sort_by(|a, b| a.code.cmp(&b.code));
        sorted.provinces.sort_by(|a, b| a.code.cmp(&b.code));
        sorted.districts.sort_by(|a, b| a.code.cmp(&b.code));
        sorted.translations.sort_by(|a, b| {
            a.entity_id
                .cmp(&b.entity_id)
                .then_with(|| a.language_code.cmp(&b.language_code))
        });

        let mut hasher = Sha256::new();
        match bincode::serialize(&sorted) {
            Ok(bytes) => hasher.update(&bytes),
            // Serializing plain rows cannot fail; hash the debug form regardless
            Err(_) => hasher.update(format!("{:?}", sorted).as_bytes()),
        }
        hex::encode(hasher.finalize())
    }

    /// Load compiled gazetteer data from disk
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file: DataFile = bincode::deserialize(bytes)?;

        if file.version != DATA_FORMAT_VERSION {
            return Err(GatewayError::SnapshotFormat(format!(
                "version mismatch: expected {}, got {}",
                DATA_FORMAT_VERSION, file.version
            )));
        }

        Ok(file.data)
    }

    /// Save compiled gazetteer data to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = DataFile {
            version: DATA_FORMAT_VERSION,
            data: self.clone(),
        };
        std::fs::write(path, bincode::serialize(&file)?)?;
        Ok(())
    }
}
