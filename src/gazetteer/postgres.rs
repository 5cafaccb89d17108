//! Postgres-backed gazetteer store
//!
//! All four tables are read inside one read-only `REPEATABLE READ`
//! transaction so a snapshot never mixes rows from before and after a
//! concurrent approval. Expected layout (see `sql/gazetteer_schema.sql`):
//!
//! ```text
//! <schema>.countries    (country_id, code, name)
//! <schema>.provinces    (province_id, code, country_id, name, sort_order)
//! <schema>.districts    (district_id, code, country_id, province_id, name)
//! <schema>.translations (entity_id, language_code, canonical_name, aliases text[])
//! ```

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use super::model::{
    CountryRow, DistrictRow, GazetteerData, LanguageScope, ProvinceRow, TranslationRow,
};
use super::store::GazetteerStore;
use crate::error::{GatewayError, Result};

pub struct PgGazetteerStore {
    pool: PgPool,
    schema: String,
}

impl PgGazetteerStore {
    /// Wrap an existing pool
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Result<Self> {
        let schema = schema.into();
        validate_identifier(&schema)?;
        Ok(Self { pool, schema })
    }

    /// Connect a small pool; the gateway only reads during refreshes
    pub async fn connect(database_url: &str, schema: impl Into<String>) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to connect to gazetteer database");
                GatewayError::StoreUnavailable(e.to_string())
            })?;

        Self::new(pool, schema)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Schema names are interpolated into SQL, so only plain identifiers pass
fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        Err(GatewayError::Config(format!(
            "invalid gazetteer schema name '{}'",
            name
        )))
    }
}

/// Translations in scope; `$1` holds canonical tags (lowercase, `-`), or NULL for all
fn translations_query(schema: &str) -> String {
    format!(
        r#"
        SELECT entity_id, language_code, canonical_name, aliases
        FROM {schema}.translations
        WHERE $1::text[] IS NULL
           OR lower(replace(language_code, '_', '-')) = ANY($1)
        ORDER BY entity_id, language_code
        "#
    )
}

#[async_trait]
impl GazetteerStore for PgGazetteerStore {
    async fn load_snapshot(&self, scope: &LanguageScope) -> Result<GazetteerData> {
        let start = std::time::Instant::now();
        let schema = &self.schema;
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let countries = sqlx::query_as::<_, (Uuid, String, String)>(&format!(
            r#"SELECT country_id, code, name FROM {schema}.countries ORDER BY code"#
        ))
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(id, code, name)| CountryRow { id, code, name })
        .collect();

        let provinces = sqlx::query_as::<_, (Uuid, String, Uuid, String, i32)>(&format!(
            r#"
            SELECT province_id, code, country_id, name, sort_order
            FROM {schema}.provinces
            ORDER BY code
            "#
        ))
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(id, code, country_id, name, sort_order)| ProvinceRow {
            id,
            code,
            country_id,
            name,
            sort_order,
        })
        .collect();

        let districts = sqlx::query_as::<_, (Uuid, String, Uuid, Uuid, String)>(&format!(
            r#"
            SELECT district_id, code, country_id, province_id, name
            FROM {schema}.districts
            ORDER BY code
            "#
        ))
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(id, code, country_id, province_id, name)| DistrictRow {
            id,
            code,
            country_id,
            province_id,
            name,
        })
        .collect();

        let translations = sqlx::query_as::<_, (Uuid, String, String, Vec<String>)>(
            &translations_query(schema),
        )
        .bind(scope.languages())
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(
            |(entity_id, language_code, canonical_name, aliases)| TranslationRow {
                entity_id,
                language_code,
                canonical_name,
                aliases,
            },
        )
        .collect();

        tx.commit().await?;

        let data = GazetteerData {
            countries,
            provinces,
            districts,
            translations,
        };

        tracing::debug!(
            countries = data.countries.len(),
            provinces = data.provinces.len(),
            districts = data.districts.len(),
            translations = data.translations.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded gazetteer rows from Postgres"
        );

        Ok(data)
    }

    fn describe(&self) -> String {
        format!("postgres:{}", self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("gazetteer").is_ok());
        assert!(validate_identifier("geo_v2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2geo").is_err());
        assert!(validate_identifier("geo; DROP TABLE x").is_err());
        assert!(validate_identifier("\"geo-data\"").is_err());
    }

    #[test]
    fn test_translations_query_canonicalizes_language() {
        let sql = translations_query("geo");
        assert!(sql.contains("FROM geo.translations"));
        // Scope tags are canonical, so the column is compared the same way
        assert!(sql.contains("lower(replace(language_code, '_', '-')) = ANY($1)"));
        assert!(!sql.contains(" language_code = ANY"));
    }
}
