//! Human-authored YAML gazetteer seeds
//!
//! Seeds nest provinces under countries and districts under provinces, so
//! parents are referenced by position rather than by id. Row ids are
//! derived deterministically from codes (UUID v5), which keeps content
//! hashes stable across reloads of the same file.
//!
//! ```yaml
//! countries:
//!   - code: VN
//!     name: Vietnam
//!     provinces:
//!       - code: VN_HANOI
//!         name: Hanoi
//!         translations:
//!           vi:
//!             name: Hà Nội
//!             aliases: [Hà Nội, Thủ đô]
//!         districts:
//!           - code: VN_HANOI_BA_DINH
//!             name: Ba Dinh
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::model::{
    CountryRow, DistrictRow, EntityId, GazetteerData, ProvinceRow, TranslationRow,
};
use crate::error::Result;

/// Namespace for code-derived row ids
const GAZETTEER_NAMESPACE: Uuid = Uuid::from_u128(0x6c6f_6361_7469_6f6e_2d67_6174_6577_6179);

/// Deterministic id for a gazetteer code
pub fn entity_id_for_code(code: &str) -> EntityId {
    Uuid::new_v5(&GAZETTEER_NAMESPACE, code.as_bytes())
}

/// Root of a seed file
#[derive(Debug, Clone, Deserialize)]
pub struct SeedFile {
    pub countries: Vec<SeedCountry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCountry {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub provinces: Vec<SeedProvince>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedProvince {
    pub code: String,
    pub name: String,
    /// Defaults to the province's position within its country
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub translations: BTreeMap<String, SeedTranslation>,
    #[serde(default)]
    pub districts: Vec<SeedDistrict>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedDistrict {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub translations: BTreeMap<String, SeedTranslation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedTranslation {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl SeedFile {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Flatten the nested seed into store-shaped rows
    pub fn into_data(self) -> GazetteerData {
        let mut data = GazetteerData::default();

        for country in self.countries {
            let country_id = entity_id_for_code(&country.code);
            data.countries.push(CountryRow {
                id: country_id,
                code: country.code,
                name: country.name,
            });

            for (position, province) in country.provinces.into_iter().enumerate() {
                let province_id = entity_id_for_code(&province.code);
                push_translations(&mut data, province_id, province.translations);
                data.provinces.push(ProvinceRow {
                    id: province_id,
                    code: province.code,
                    country_id,
                    name: province.name,
                    sort_order: province.sort_order.unwrap_or(position as i32 + 1),
                });

                for district in province.districts {
                    let district_id = entity_id_for_code(&district.code);
                    push_translations(&mut data, district_id, district.translations);
                    data.districts.push(DistrictRow {
                        id: district_id,
                        code: district.code,
                        country_id,
                        province_id,
                        name: district.name,
                    });
                }
            }
        }

        data
    }
}

fn push_translations(
    data: &mut GazetteerData,
    entity_id: EntityId,
    translations: BTreeMap<String, SeedTranslation>,
) {
    for (language_code, translation) in translations {
        data.translations.push(TranslationRow {
            entity_id,
            language_code,
            canonical_name: translation.name,
            aliases: translation.aliases,
        });
    }
}
