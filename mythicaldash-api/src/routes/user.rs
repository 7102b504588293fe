/// Current session profile
///
/// # Endpoint
///
/// ```text
/// GET /api/user/session
/// Cookie: user_token=<token>
/// ```
///
/// The frontend stores `user.role` from this response to decide which
/// navigation entries to show; the server re-checks capabilities on every
/// admin call.

use crate::{error::ApiResult, response::success};
use axum::{Extension, Json};
use mythicaldash_shared::{auth::authorization::Role, format::format_number, models::user::User};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Profile fields exposed to the frontend
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub uuid: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub role: Role,
    pub role_id: i32,
    pub is_admin: bool,
    pub coins: f64,
    pub coins_formatted: String,
    pub minutes_afk: i64,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        let role = user.role();
        Self {
            uuid: user.uuid,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            role,
            role_id: user.role_id,
            is_admin: role.is_admin(),
            coins: user.coins,
            coins_formatted: format_number(user.coins),
            minutes_afk: user.minutes_afk,
        }
    }
}

pub async fn session(Extension(user): Extension<User>) -> ApiResult<Json<Value>> {
    Ok(success(
        "Session is valid",
        json!({ "user": SessionUser::from(&user) }),
    ))
}
