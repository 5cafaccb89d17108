//! Entity resolution: raw alias matches → final location list
//!
//! Two passes over the deduplicated matches:
//! 1. provinces are accepted as matched
//! 2. districts are kept only if their province was accepted in pass 1,
//!    unless no province matched at all
//!
//! Output is ordered by entity code. No relevance scoring happens here;
//! callers needing ranking apply it on top.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::index::{AliasMatch, EntityKind, GazetteerSnapshot};

/// How matched districts are constrained by matched provinces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistrictFilter {
    /// Keep a district only when its province also matched (if any province did)
    #[default]
    ByMatchedProvinces,
    /// Keep every alias-matched district
    Unrestricted,
}

/// A resolved geographic reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub country_code: String,
    pub province_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district_code: Option<String>,
    /// The longest alias through which the entity matched, as seeded
    pub matched_alias: String,
    pub language_code: String,
}

impl ResolvedLocation {
    /// Most specific code: the district code if present, else the province code
    pub fn code(&self) -> &str {
        self.district_code.as_deref().unwrap_or(&self.province_code)
    }
}

/// Deduplicates, filters, and orders alias matches
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityResolver {
    filter: DistrictFilter,
}

impl EntityResolver {
    pub fn new(filter: DistrictFilter) -> Self {
        Self { filter }
    }

    pub fn resolve(
        &self,
        snapshot: &GazetteerSnapshot,
        matches: Vec<AliasMatch<'_>>,
    ) -> Vec<ResolvedLocation> {
        let best = best_match_per_entity(matches);

        let accepted_provinces: HashSet<usize> = best
            .keys()
            .copied()
            .filter(|entity| {
                snapshot
                    .entity(*entity)
                    .map(|e| e.kind == EntityKind::Province)
                    .unwrap_or(false)
            })
            .collect();

        let constrain_districts =
            self.filter == DistrictFilter::ByMatchedProvinces && !accepted_provinces.is_empty();

        let mut results: Vec<ResolvedLocation> = best
            .into_iter()
            .filter_map(|(index, m)| {
                let entity = snapshot.entity(index)?;

                if entity.kind == EntityKind::District && constrain_districts {
                    let parent = entity.parent?;
                    if !accepted_provinces.contains(&parent) {
                        tracing::trace!(district = %entity.code, "District dropped by province filter");
                        return None;
                    }
                }

                Some(ResolvedLocation {
                    country_code: entity.country_code.clone(),
                    province_code: entity.province_code.clone(),
                    district_code: entity.district_code.clone(),
                    matched_alias: m.alias.to_string(),
                    language_code: m.language.to_string(),
                })
            })
            .collect();

        results.sort_by(|a, b| a.code().cmp(b.code()));
        results
    }
}

/// One match per entity: longest normalized alias, then language, then alias text
fn best_match_per_entity(matches: Vec<AliasMatch<'_>>) -> HashMap<usize, AliasMatch<'_>> {
    let mut best: HashMap<usize, AliasMatch<'_>> = HashMap::new();

    for m in matches {
        let replace = best
            .get(&m.entity)
            .map_or(true, |current| is_better(&m, current));
        if replace {
            best.insert(m.entity, m);
        }
    }

    best
}

fn is_better(candidate: &AliasMatch<'_>, current: &AliasMatch<'_>) -> bool {
    candidate
        .alias_len
        .cmp(&current.alias_len)
        .then_with(|| current.language.cmp(candidate.language))
        .then_with(|| current.alias.cmp(candidate.alias))
        .is_gt()
}
