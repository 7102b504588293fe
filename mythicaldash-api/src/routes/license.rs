/// License information relay
///
/// # Endpoint
///
/// ```text
/// GET /api/system/license/:key/info
/// ```
///
/// # Response
///
/// ```json
/// { "success": true, "code": 200, "message": "...", "data": { ... } }
/// ```
///
/// `data` is whatever the license service returned for the key.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::success,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

pub async fn license_info(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Value>> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ApiError::InvalidRequest("License key is required".to_string()));
    }

    let info = state.license.check(key).await?;

    Ok(success("License information retrieved", json!({ "data": info })))
}
