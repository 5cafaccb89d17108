//! HTTP/JSON endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/v1/resolve` | POST | Resolve locations in free text |
//! | `/v1/refresh` | POST | Reload the gazetteer and swap the snapshot |
//! | `/v1/status` | GET | Readiness and active snapshot statistics |
//! | `/health` | GET | 200 once a snapshot is loaded, 503 before |

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::engine::{EngineStatus, Resolution, ResolutionEngine, ResolveRequest};
use crate::error::GatewayError;
use crate::index::SnapshotStats;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

/// Engine errors mapped onto HTTP status codes
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            GatewayError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            GatewayError::InvalidAliasData { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_alias_data")
            }
            GatewayError::Integrity(_) => (StatusCode::INTERNAL_SERVER_ERROR, "integrity"),
            GatewayError::SnapshotFormat(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "snapshot_format")
            }
            GatewayError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config"),
            GatewayError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io"),
            GatewayError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
            kind,
        });
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot_version: Option<u64>,
}

/// Build the router over a shared engine
pub fn router(engine: Arc<ResolutionEngine>) -> Router {
    Router::new()
        .route("/v1/resolve", post(resolve))
        .route("/v1/refresh", post(refresh))
        .route("/v1/status", get(status))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

/// POST /v1/resolve
async fn resolve(
    State(engine): State<Arc<ResolutionEngine>>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<Resolution>, ApiError> {
    Ok(Json(engine.resolve(&request).await?))
}

/// POST /v1/refresh - returns once the new snapshot is active
async fn refresh(
    State(engine): State<Arc<ResolutionEngine>>,
) -> Result<Json<SnapshotStats>, ApiError> {
    Ok(Json(engine.refresh().await?))
}

async fn status(State(engine): State<Arc<ResolutionEngine>>) -> Json<EngineStatus> {
    Json(engine.status().await)
}

async fn health(State(engine): State<Arc<ResolutionEngine>>) -> (StatusCode, Json<HealthResponse>) {
    match engine.current().await {
        Some(snapshot) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                snapshot_version: Some(snapshot.version()),
            }),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "loading",
                snapshot_version: None,
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let response = ApiError(GatewayError::StoreUnavailable("down".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = ApiError(GatewayError::InvalidAliasData {
            entity_code: "VN_HANOI".to_string(),
            language_code: "vi".to_string(),
            reason: "duplicate alias 'HN'".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = ApiError(GatewayError::Config("bad".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
