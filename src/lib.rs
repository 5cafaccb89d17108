//! Location Gateway - Multi-script Location Alias Resolution
//!
//! Resolves free-form listing text ("Căn hộ Quận 7, TP.HCM", "東京都港区",
//! "ขายคอนโดกรุงเทพ") into structured references: country, province, and
//! optionally district. Matching runs against an immutable in-memory
//! snapshot of the gazetteer with one Aho-Corasick automaton per language,
//! so a query is a single pass over the normalized text.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Callers: crawler, extraction service, chat orchestrator        │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │  resolve / refresh
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Resolution Engine (HTTP / library)             │
//! │          Arc<GazetteerSnapshot>, swapped atomically             │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   Normalizer (per script family) → Alias Matcher (per language) │
//! │        → Entity Resolver (dedup, province→district filter)      │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Gazetteer Store                                │
//! │         (Postgres / YAML seed / compiled bincode)               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use location_gateway::{open_store, EngineSettings, GatewayConfig, ResolutionEngine};
//!
//! let config = GatewayConfig::from_file("config/location_gateway.yaml")?;
//! let store = open_store(&config.store).await?;
//! let engine = ResolutionEngine::new(store, EngineSettings::from_config(&config)?);
//!
//! engine.refresh().await?;
//! let results = engine.resolve_text("Dự án tại Hà Nội và TP.HCM", &["vi"]).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod gazetteer;
pub mod index;
pub mod normalize;
pub mod refresh;
pub mod resolver;
pub mod server;

// Re-export main types
pub use config::{GatewayConfig, InvalidAliasPolicy, StartupMode};
pub use engine::{EngineSettings, EngineStatus, Resolution, ResolutionEngine, ResolveRequest};
pub use error::{GatewayError, Result};
pub use gazetteer::{
    open_store, FileGazetteerStore, GazetteerData, GazetteerStore, LanguageScope,
    PgGazetteerStore, SeedFile, StaticGazetteerStore,
};
pub use index::{GazetteerSnapshot, MatcherKind, SnapshotSettings, SnapshotStats};
pub use normalize::{ScriptFamilies, ScriptFamily, TextNormalizer};
pub use refresh::{run_refresh_loop, spawn_refresh_loop};
pub use resolver::{DistrictFilter, EntityResolver, ResolvedLocation};
