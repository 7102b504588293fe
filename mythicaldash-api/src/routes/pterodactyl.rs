/// Pterodactyl panel lookups for admins
///
/// # Endpoint
///
/// ```text
/// GET /api/admin/pterodactyl/users/:id
/// ```
///
/// # Errors
///
/// - `400 INVALID_REQUEST`: `id` is not a number
/// - `401 INVALID_SESSION`: Caller may not view panel users
/// - `404 NOT_FOUND`: Panel has no such user
/// - `502 UPSTREAM_ERROR`: Panel returned an error
/// - `500 SERVICE_UNAVAILABLE`: Panel unreachable or not configured

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::success,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use mythicaldash_shared::{
    auth::authorization::{require_capability, Capability},
    models::user::User,
};
use serde_json::{json, Value};

pub async fn get_panel_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    require_capability(&user, Capability::ViewPanelUsers)?;

    let id: u64 = id
        .parse()
        .map_err(|_| ApiError::InvalidRequest("User id must be a number".to_string()))?;

    let panel = state
        .panel
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Pterodactyl is not configured".to_string()))?;

    let panel_user = panel.get_user(id).await?;

    Ok(success("Panel user retrieved", json!({ "user": panel_user })))
}
