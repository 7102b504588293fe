/// Admin settings endpoints
///
/// # Endpoints
///
/// - `POST /api/admin/settings/update` - Form fields `key`, `value`
/// - `GET /api/admin/settings/get` - Every setting as a key/value map
///
/// Both require a session; the capability checks live in
/// [`mythicaldash_shared::services::settings`].

use crate::{app::AppState, error::ApiResult, middleware::client_ip::ClientIp, response::success};
use axum::{extract::State, Extension, Form, Json};
use mythicaldash_shared::models::user::User;
use serde::Deserialize;
use serde_json::{json, Value};

/// Update form; both fields optional so blanks reach validation
#[derive(Debug, Default, Deserialize)]
pub struct SettingsForm {
    pub key: Option<String>,
    pub value: Option<String>,
}

/// Update a setting
///
/// # Errors
///
/// - `400 INVALID_REQUEST`: Missing or blank `key`/`value` (checked first)
/// - `401 INVALID_SESSION`: No session, or the role can't manage settings
/// - `500 SERVICE_UNAVAILABLE`: Setting could not be stored
pub async fn update_setting(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ClientIp(ip): ClientIp,
    form: Option<Form<SettingsForm>>,
) -> ApiResult<Json<Value>> {
    let form = form.map(|Form(f)| f).unwrap_or_default();

    let updated = state
        .settings
        .update(&user, &ip, form.key.as_deref(), form.value.as_deref())
        .await?;

    Ok(success(
        "Setting updated successfully",
        json!({ "setting": updated }),
    ))
}

/// Read every setting
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Json<Value>> {
    let settings = state.settings.all(&user).await?;

    Ok(success("Settings retrieved", json!({ "settings": settings })))
}
