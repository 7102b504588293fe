/// Leaderboard endpoint
///
/// # Endpoint
///
/// ```text
/// GET /api/user/leaderboard/:type
/// ```
///
/// `type` is one of `coins`, `minutes_afk`, `referrals`.
///
/// # Errors
///
/// - `400 INVALID_TYPE`: Unknown type
/// - `400 LEADERBOARD_DISABLED`: Switched off in settings
/// - `401 INVALID_SESSION`: No session

use crate::{app::AppState, error::ApiResult, response::success};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use mythicaldash_shared::models::user::User;
use serde_json::{json, Value};

pub async fn leaderboard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(kind): Path<String>,
) -> ApiResult<Json<Value>> {
    let entries = state.leaderboard.query(&user, &kind).await?;

    Ok(success(
        "Leaderboard retrieved",
        json!({ "type": kind, "leaderboard": entries }),
    ))
}
