//! Gazetteer store abstraction
//!
//! A `GazetteerStore` hands out complete `GazetteerData` generations. It
//! never returns partial data: either every row in scope is read, or the
//! load fails with `StoreUnavailable`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::model::{GazetteerData, LanguageScope};
use super::seed::SeedFile;
use crate::error::{GatewayError, Result};

/// Source of gazetteer snapshots
///
/// Implementations must be Send + Sync for use from the refresh loop.
#[async_trait]
pub trait GazetteerStore: Send + Sync {
    /// Read every country/province/district row and the translations in `scope`
    async fn load_snapshot(&self, scope: &LanguageScope) -> Result<GazetteerData>;

    /// Short description for logs (never includes credentials)
    fn describe(&self) -> String;
}

/// In-memory store, for embedding and tests
///
/// `replace` swaps the whole dataset, mimicking an approval workflow
/// writing to the real store.
pub struct StaticGazetteerStore {
    data: RwLock<Option<GazetteerData>>,
}

impl StaticGazetteerStore {
    pub fn new(data: GazetteerData) -> Self {
        Self {
            data: RwLock::new(Some(data)),
        }
    }

    /// A store whose reads fail, as if the backing database were down
    pub fn unavailable() -> Self {
        Self {
            data: RwLock::new(None),
        }
    }

    pub async fn replace(&self, data: GazetteerData) {
        *self.data.write().await = Some(data);
    }

    pub async fn take_offline(&self) {
        *self.data.write().await = None;
    }
}

#[async_trait]
impl GazetteerStore for StaticGazetteerStore {
    async fn load_snapshot(&self, scope: &LanguageScope) -> Result<GazetteerData> {
        let guard = self.data.read().await;
        let mut data = guard
            .as_ref()
            .cloned()
            .ok_or_else(|| GatewayError::StoreUnavailable("static store offline".to_string()))?;
        data.retain_languages(scope);
        Ok(data)
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// File-backed store: a YAML seed (`.yaml`/`.yml`) or compiled bincode data
pub struct FileGazetteerStore {
    path: PathBuf,
}

impl FileGazetteerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_yaml(&self) -> bool {
        matches!(
            self.path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        )
    }
}

#[async_trait]
impl GazetteerStore for FileGazetteerStore {
    async fn load_snapshot(&self, scope: &LanguageScope) -> Result<GazetteerData> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            GatewayError::StoreUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let mut data = if self.is_yaml() {
            let content = String::from_utf8(bytes)
                .map_err(|e| GatewayError::Config(format!("seed is not UTF-8: {}", e)))?;
            SeedFile::from_yaml(&content)?.into_data()
        } else {
            GazetteerData::from_bytes(&bytes)?
        };

        data.retain_languages(scope);
        Ok(data)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"
countries:
  - code: JP
    name: Japan
    provinces:
      - code: JP_TOKYO
        name: Tokyo
        translations:
          ja:
            name: 東京都
            aliases: [東京, とうきょう, Tokyo]
          en:
            name: Tokyo
"#;

    #[tokio::test]
    async fn test_static_store_scoped() {
        let data = SeedFile::from_yaml(SEED).unwrap().into_data();
        let store = StaticGazetteerStore::new(data);

        let all = store.load_snapshot(&LanguageScope::All).await.unwrap();
        assert_eq!(all.translations.len(), 2);

        let ja = store
            .load_snapshot(&LanguageScope::from_languages(["ja"]))
            .await
            .unwrap();
        assert_eq!(ja.translations.len(), 1);
        assert_eq!(ja.provinces.len(), 1);
    }

    #[tokio::test]
    async fn test_static_store_offline() {
        let store = StaticGazetteerStore::unavailable();
        let err = store.load_snapshot(&LanguageScope::All).await.unwrap_err();
        assert!(matches!(err, GatewayError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_file_store_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.yaml");
        std::fs::write(&path, SEED).unwrap();

        let store = FileGazetteerStore::new(&path);
        let data = store.load_snapshot(&LanguageScope::All).await.unwrap();
        assert_eq!(data.provinces[0].code, "JP_TOKYO");
        assert!(store.describe().starts_with("file:"));
    }

    #[tokio::test]
    async fn test_file_store_compiled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gazetteer.bin");
        let data = SeedFile::from_yaml(SEED).unwrap().into_data();
        data.save(&path).unwrap();

        let store = FileGazetteerStore::new(&path);
        let loaded = store.load_snapshot(&LanguageScope::All).await.unwrap();
        assert_eq!(loaded, data);
    }

    #[tokio::test]
    async fn test_file_store_missing_file() {
        let store = FileGazetteerStore::new("/nonexistent/gazetteer.yaml");
        let err = store.load_snapshot(&LanguageScope::All).await.unwrap_err();
        assert!(err.is_transient());
    }
}
