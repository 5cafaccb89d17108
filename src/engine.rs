//! Resolution engine: the snapshot holder behind `resolve` and `refresh`
//!
//! Queries clone the active `Arc<GazetteerSnapshot>` under a momentary read
//! lock and run without any lock held. A refresh loads and builds the next
//! snapshot off to the side, then swaps the reference; queries already in
//! flight finish against the snapshot they started with.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::gazetteer::{GazetteerStore, LanguageScope};
use crate::index::{DistrictAliasRule, GazetteerSnapshot, SnapshotSettings, SnapshotStats};
use crate::normalize::ScriptFamilies;
use crate::resolver::{DistrictFilter, EntityResolver, ResolvedLocation};

/// Engine construction settings
#[derive(Clone)]
pub struct EngineSettings {
    pub snapshot: SnapshotSettings,
    /// Upper bound on a single store load
    pub load_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            snapshot: SnapshotSettings::default(),
            load_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineSettings {
    /// Compile settings from configuration (district rule patterns included)
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let district_rules = config
            .district_alias_rules
            .iter()
            .map(DistrictAliasRule::from_config)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            snapshot: SnapshotSettings {
                scope: LanguageScope::from_languages(&config.languages),
                families: ScriptFamilies::with_overrides(&config.script_families),
                district_rules,
                invalid_alias_policy: config.invalid_alias_policy,
                matcher: config.matcher,
            },
            load_timeout: Duration::from_secs(config.refresh.load_timeout_secs),
        })
    }
}

/// A `resolve` call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveRequest {
    pub text: String,
    /// Languages to search; empty searches every loaded language
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub district_filter: DistrictFilter,
}

impl ResolveRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_district_filter(mut self, filter: DistrictFilter) -> Self {
        self.district_filter = filter;
        self
    }
}

/// Result of a `resolve` call, tagged with the snapshot that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub snapshot_version: u64,
    pub results: Vec<ResolvedLocation>,
}

/// Readiness plus statistics of the active snapshot
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotStats>,
}

/// Holds the active snapshot and rebuilds it from a store on demand
pub struct ResolutionEngine {
    store: Arc<dyn GazetteerStore>,
    settings: EngineSettings,
    active: RwLock<Option<Arc<GazetteerSnapshot>>>,
    /// Serializes refreshes so builds never interleave
    refresh_lock: Mutex<()>,
}

impl ResolutionEngine {
    /// Create an engine with no snapshot loaded; call `refresh` before resolving
    pub fn new(store: Arc<dyn GazetteerStore>, settings: EngineSettings) -> Self {
        Self {
            store,
            settings,
            active: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The active snapshot, if one has been loaded
    pub async fn current(&self) -> Option<Arc<GazetteerSnapshot>> {
        self.active.read().await.clone()
    }

    pub async fn is_ready(&self) -> bool {
        self.active.read().await.is_some()
    }

    pub async fn status(&self) -> EngineStatus {
        let snapshot = self.current().await;
        EngineStatus {
            ready: snapshot.is_some(),
            snapshot: snapshot.map(|s| s.stats()),
        }
    }

    /// Resolve locations mentioned in `request.text`
    ///
    /// Fails with `StoreUnavailable` only when no snapshot has been loaded.
    /// No match is an empty result.
    pub async fn resolve(&self, request: &ResolveRequest) -> Result<Resolution> {
        let snapshot = self.current().await.ok_or_else(|| {
            GatewayError::StoreUnavailable("no gazetteer snapshot loaded".to_string())
        })?;

        Ok(Self::resolve_in(&snapshot, request))
    }

    /// Shorthand for `resolve` with the default district filter
    pub async fn resolve_text(
        &self,
        text: &str,
        languages: &[&str],
    ) -> Result<Vec<ResolvedLocation>> {
        let request = ResolveRequest::new(text).with_languages(languages.iter().copied());
        Ok(self.resolve(&request).await?.results)
    }

    /// Resolve against a specific snapshot
    pub fn resolve_in(snapshot: &GazetteerSnapshot, request: &ResolveRequest) -> Resolution {
        let results = if request.text.trim().is_empty() {
            vec![]
        } else {
            let matches = snapshot.find_matches(&request.text, &request.languages);
            EntityResolver::new(request.district_filter).resolve(snapshot, matches)
        };

        tracing::debug!(
            snapshot_version = snapshot.version(),
            results = results.len(),
            "Resolved"
        );

        Resolution {
            snapshot_version: snapshot.version(),
            results,
        }
    }

    /// Reload from the store and swap in the new snapshot
    ///
    /// Returns once the swap is complete. On failure the previous snapshot
    /// (if any) stays active.
    pub async fn refresh(&self) -> Result<SnapshotStats> {
        let _guard = self.refresh_lock.lock().await;
        let started = Instant::now();

        let result = self.load_and_build().await;

        match result {
            Ok(snapshot) => {
                let stats = snapshot.stats();
                *self.active.write().await = Some(Arc::new(snapshot));

                tracing::info!(
                    snapshot_version = stats.version,
                    hash = %stats.hash,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Gazetteer snapshot swapped"
                );
                Ok(stats)
            }
            Err(e) => {
                tracing::warn!(
                    store = %self.store.describe(),
                    error = %e,
                    "Snapshot refresh failed, keeping previous snapshot"
                );
                Err(e)
            }
        }
    }

    async fn load_and_build(&self) -> Result<GazetteerSnapshot> {
        let scope = self.settings.snapshot.scope.clone();

        let data = tokio::time::timeout(self.settings.load_timeout, self.store.load_snapshot(&scope))
            .await
            .map_err(|_| {
                GatewayError::StoreUnavailable(format!(
                    "load from {} timed out after {}s",
                    self.store.describe(),
                    self.settings.load_timeout.as_secs_f64()
                ))
            })??;

        tracing::debug!(
            countries = data.countries.len(),
            provinces = data.provinces.len(),
            districts = data.districts.len(),
            records = data.translations.len(),
            "Gazetteer data loaded"
        );

        let version = self
            .current()
            .await
            .map(|s| s.version())
            .unwrap_or(0)
            + 1;
        let settings = self.settings.snapshot.clone();

        // Normalizing and compiling automatons is CPU-bound
        tokio::task::spawn_blocking(move || GazetteerSnapshot::build(data, version, &settings))
            .await
            .map_err(|e| GatewayError::Internal(format!("snapshot build task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::{GazetteerData, SeedFile, StaticGazetteerStore};
    use async_trait::async_trait;

    const SEED: &str = r#"
countries:
  - code: VN
    name: Vietnam
    provinces:
      - code: VN_HANOI
        name: Hanoi
        translations:
          vi:
            name: Hà Nội
            aliases: [Ha Noi, HN]
"#;

    fn data() -> GazetteerData {
        SeedFile::from_yaml(SEED).unwrap().into_data()
    }

    struct SlowStore;

    #[async_trait]
    impl GazetteerStore for SlowStore {
        async fn load_snapshot(&self, _scope: &LanguageScope) -> Result<GazetteerData> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(GazetteerData::default())
        }

        fn describe(&self) -> String {
            "slow".to_string()
        }
    }

    #[tokio::test]
    async fn test_resolve_before_load_fails_fast() {
        let engine = ResolutionEngine::new(
            Arc::new(StaticGazetteerStore::new(data())),
            EngineSettings::default(),
        );

        let err = engine.resolve(&ResolveRequest::new("")).await.unwrap_err();
        assert!(matches!(err, GatewayError::StoreUnavailable(_)));
        assert!(!engine.is_ready().await);
    }

    #[tokio::test]
    async fn test_refresh_then_resolve() {
        let engine = ResolutionEngine::new(
            Arc::new(StaticGazetteerStore::new(data())),
            EngineSettings::default(),
        );

        let stats = engine.refresh().await.unwrap();
        assert_eq!(stats.version, 1);

        let results = engine.resolve_text("Bán nhà HA NOI", &["vi"]).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].province_code, "VN_HANOI");

        assert!(engine.resolve_text("", &["vi"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_versions_increase() {
        let engine = ResolutionEngine::new(
            Arc::new(StaticGazetteerStore::new(data())),
            EngineSettings::default(),
        );

        engine.refresh().await.unwrap();
        engine.refresh().await.unwrap();
        let resolution = engine.resolve(&ResolveRequest::new("HN")).await.unwrap();
        assert_eq!(resolution.snapshot_version, 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_snapshot() {
        let store = Arc::new(StaticGazetteerStore::new(data()));
        let engine = ResolutionEngine::new(store.clone(), EngineSettings::default());
        engine.refresh().await.unwrap();

        store.take_offline().await;
        let err = engine.refresh().await.unwrap_err();
        assert!(err.is_transient());

        let status = engine.status().await;
        assert!(status.ready);
        assert_eq!(status.snapshot.unwrap().version, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_timeout() {
        let settings = EngineSettings {
            load_timeout: Duration::from_secs(1),
            ..Default::default()
        };
        let engine = ResolutionEngine::new(Arc::new(SlowStore), settings);

        let err = engine.refresh().await.unwrap_err();
        assert!(matches!(err, GatewayError::StoreUnavailable(ref msg) if msg.contains("timed out")));
        assert!(!engine.is_ready().await);
    }

    #[test]
    fn test_request_deserialize_defaults() {
        let request: ResolveRequest = serde_json::from_str(r#"{"text": "Hà Nội"}"#).unwrap();
        assert!(request.languages.is_empty());
        assert_eq!(request.district_filter, DistrictFilter::ByMatchedProvinces);

        let request: ResolveRequest = serde_json::from_str(
            r#"{"text": "x", "languages": ["vi"], "district_filter": "unrestricted"}"#,
        )
        .unwrap();
        assert_eq!(request.languages, vec!["vi"]);
        assert_eq!(request.district_filter, DistrictFilter::Unrestricted);
    }

    #[test]
    fn test_settings_from_config() {
        let config = GatewayConfig::from_yaml(
            r#"
refresh:
  interval_secs: 60
  startup_mode: sync
  load_timeout_secs: 5
store:
  kind: file
  path: data/gazetteer_seed.yaml
languages: [vi, km]
district_alias_rules:
  - country: VN
    language: vi
    code_pattern: '^Q(\d+)$'
    templates: ["quận {1}"]
"#,
        )
        .unwrap();

        let settings = EngineSettings::from_config(&config).unwrap();
        assert_eq!(settings.load_timeout, Duration::from_secs(5));
        assert!(settings.snapshot.scope.includes("km"));
        assert!(!settings.snapshot.scope.includes("ja"));
        assert_eq!(settings.snapshot.district_rules.len(), 1);
    }
}
