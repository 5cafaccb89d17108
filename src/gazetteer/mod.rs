//! Gazetteer store: the administrative hierarchy and its per-language aliases

pub mod model;
pub mod postgres;
pub mod seed;
pub mod store;

use std::sync::Arc;

pub use model::{
    CountryRow, DistrictRow, EntityId, GazetteerData, LanguageScope, ProvinceRow,
    TranslationRow, DATA_FORMAT_VERSION,
};
pub use postgres::PgGazetteerStore;
pub use seed::{entity_id_for_code, SeedFile};
pub use store::{FileGazetteerStore, GazetteerStore, StaticGazetteerStore};

use crate::config::{StoreConfig, StoreKind};
use crate::error::{GatewayError, Result};

/// Open the store described by configuration
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn GazetteerStore>> {
    match config.kind {
        StoreKind::Postgres => {
            let url = config.database_url()?;
            let store = PgGazetteerStore::connect(&url, config.schema.clone()).await?;
            Ok(Arc::new(store))
        }
        StoreKind::File => {
            let path = config.path.as_ref().ok_or_else(|| {
                GatewayError::Config("store.path is required for file stores".to_string())
            })?;
            Ok(Arc::new(FileGazetteerStore::new(path)))
        }
    }
}
