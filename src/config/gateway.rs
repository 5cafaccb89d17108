//! Gateway configuration parsing
//!
//! Loads the location gateway configuration from YAML and provides
//! strongly-typed access to refresh, store, and matching settings.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{GatewayError, Result};
use crate::index::MatcherKind;
use crate::normalize::ScriptFamily;

/// Root configuration structure for the location gateway
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub refresh: RefreshConfig,
    pub store: StoreConfig,
    /// Languages to load; empty loads every language in the store
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub invalid_alias_policy: InvalidAliasPolicy,
    /// Language → script family overrides on top of the built-in table
    #[serde(default)]
    pub script_families: HashMap<String, ScriptFamily>,
    /// Per-country rules deriving district aliases from district codes
    #[serde(default)]
    pub district_alias_rules: Vec<DistrictAliasRuleConfig>,
    #[serde(default)]
    pub matcher: MatcherKind,
}

/// Configuration for snapshot refresh behavior
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Background refresh period; 0 disables the loop
    pub interval_secs: u64,
    pub startup_mode: StartupMode,
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,
}

fn default_load_timeout() -> u64 {
    30
}

/// Startup mode for the initial snapshot load
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StartupMode {
    /// Load asynchronously (server starts immediately, 503 until ready)
    Async,
    /// Load synchronously (server waits until ready)
    Sync,
}

/// Which backing store to read the gazetteer from
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Postgres,
    File,
}

/// Store connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// Environment variable holding the Postgres connection string
    #[serde(default = "default_connection_string_env")]
    pub connection_string_env: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Seed (`.yaml`) or compiled (`.bin`) gazetteer file for `kind: file`
    #[serde(default)]
    pub path: Option<String>,
}

fn default_connection_string_env() -> String {
    "DATABASE_URL".to_string()
}

fn default_schema() -> String {
    "gazetteer".to_string()
}

/// What to do with a translation carrying an empty or duplicate alias
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvalidAliasPolicy {
    /// Exclude the offending translation and keep building
    #[default]
    SkipTranslation,
    /// Fail the whole snapshot build
    RejectSnapshot,
}

/// A district alias derivation rule
///
/// For every district of `country`, the code segment after the last `_` is
/// matched against `code_pattern`; each template is expanded with `{N}`
/// replaced by capture group N and added as a `language` alias.
#[derive(Debug, Clone, Deserialize)]
pub struct DistrictAliasRuleConfig {
    pub country: String,
    pub language: String,
    pub code_pattern: String,
    pub templates: Vec<String>,
}

impl StoreConfig {
    /// Resolve the database URL from the configured environment variable
    pub fn database_url(&self) -> Result<String> {
        std::env::var(&self.connection_string_env).map_err(|_| {
            GatewayError::Config(format!(
                "environment variable {} is not set",
                self.connection_string_env
            ))
        })
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: GatewayConfig = serde_yaml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.store.kind == StoreKind::File && self.store.path.is_none() {
            return Err(GatewayError::Config(
                "store.path is required when store.kind is file".to_string(),
            ));
        }
        for rule in &self.district_alias_rules {
            if rule.templates.is_empty() {
                return Err(GatewayError::Config(format!(
                    "district alias rule for {} has no templates",
                    rule.country
                )));
            }
        }
        Ok(())
    }
}
