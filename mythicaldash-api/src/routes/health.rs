/// Health check endpoint
///
/// Reports whether the server is running and whether its storage is
/// reachable.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "storage": "postgres"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use mythicaldash_shared::db::pool::{health_check as db_health_check, PoolStats};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected`, `disconnected` or `not_applicable`
    pub database: String,

    /// `postgres` or `memory`
    pub storage: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let Some(pool) = &state.db else {
        return Ok(Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: "not_applicable".to_string(),
            storage: "memory".to_string(),
            pool: None,
        }));
    };

    let connected = db_health_check(pool).await.is_ok();

    Ok(Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        storage: "postgres".to_string(),
        pool: Some(PoolStats::of(pool)),
    }))
}
