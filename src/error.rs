//! Error types for the location gateway
//!
//! No-match and ambiguous matches are never errors: they surface as an
//! empty or multi-entry result from `resolve`. Only structural failures
//! (store unreachable, corrupt snapshot data) are represented here.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while loading, building, or querying a snapshot
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The backing store could not be read, the load timed out, or no
    /// snapshot has been loaded yet
    #[error("Gazetteer store unavailable: {0}")]
    StoreUnavailable(String),

    /// A translation carried an empty or duplicated alias
    #[error("Invalid alias data for {entity_code}/{language_code}: {reason}")]
    InvalidAliasData {
        entity_code: String,
        language_code: String,
        reason: String,
    },

    /// A row references a parent that does not exist in the snapshot
    #[error("Gazetteer integrity violation: {0}")]
    Integrity(String),

    /// A compiled snapshot file could not be decoded
    #[error("Snapshot format error: {0}")]
    SnapshotFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot build task panicked or was cancelled
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Whether callers may reasonably retry (e.g. serve stale data meanwhile)
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::StoreUnavailable(_))
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(error: sqlx::Error) -> Self {
        GatewayError::StoreUnavailable(error.to_string())
    }
}

impl From<serde_yaml::Error> for GatewayError {
    fn from(error: serde_yaml::Error) -> Self {
        GatewayError::Config(error.to_string())
    }
}

impl From<bincode::Error> for GatewayError {
    fn from(error: bincode::Error) -> Self {
        GatewayError::SnapshotFormat(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_unavailable_is_transient() {
        let err = GatewayError::StoreUnavailable("connection refused".to_string());
        assert!(err.is_transient());
        assert_eq!(
            err.to_string(),
            "Gazetteer store unavailable: connection refused"
        );
    }

    #[test]
    fn test_invalid_alias_message() {
        let err = GatewayError::InvalidAliasData {
            entity_code: "VN_HANOI".to_string(),
            language_code: "vi".to_string(),
            reason: "duplicate alias 'Hà Nội'".to_string(),
        };
        assert!(!err.is_transient());
        assert!(err.to_string().contains("VN_HANOI/vi"));
    }
}
