//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use location_gateway::index::DistrictAliasRule;
use location_gateway::{
    EngineSettings, GazetteerData, ResolutionEngine, ResolvedLocation, SeedFile,
    StaticGazetteerStore,
};

/// The shipped seed gazetteer
pub const SEED: &str = include_str!("../../data/gazetteer_seed.yaml");

pub fn seed_data() -> GazetteerData {
    SeedFile::from_yaml(SEED).unwrap().into_data()
}

/// VN_HCMC_Q7 → "quận 7", "q7", "q.7"
pub fn quan_rule() -> DistrictAliasRule {
    DistrictAliasRule::new(
        "VN",
        "vi",
        r"^Q(\d+)$",
        vec!["quận {1}".to_string(), "q{1}".to_string(), "q.{1}".to_string()],
    )
    .unwrap()
}

pub fn settings() -> EngineSettings {
    let mut settings = EngineSettings::default();
    settings.snapshot.district_rules = vec![quan_rule()];
    settings
}

pub fn engine_with(store: Arc<StaticGazetteerStore>) -> Arc<ResolutionEngine> {
    Arc::new(ResolutionEngine::new(store, settings()))
}

/// Engine over the seed gazetteer with one snapshot loaded
pub async fn loaded_engine() -> Arc<ResolutionEngine> {
    let engine = engine_with(Arc::new(StaticGazetteerStore::new(seed_data())));
    engine.refresh().await.unwrap();
    engine
}

pub fn codes(results: &[ResolvedLocation]) -> Vec<&str> {
    results.iter().map(|r| r.code()).collect()
}
