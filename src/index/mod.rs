//! Alias index: matchers, district alias derivation, and snapshots

pub mod derive;
pub mod matcher;
pub mod snapshot;

pub use derive::{apply_district_rules, DistrictAliasRule};
pub use matcher::{
    build_matcher, AhoCorasickMatcher, AliasMatcher, LinearScanMatcher, MatcherKind, PatternHit,
};
pub use snapshot::{
    AliasMatch, EntityKind, GazetteerSnapshot, LanguageIndex, LanguageStats, LocationEntity,
    SkippedTranslation, SnapshotSettings, SnapshotStats,
};
