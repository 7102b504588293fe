/// Turnstile token check
///
/// # Endpoint
///
/// ```text
/// POST /api/system/turnstile/verify
/// Content-Type: application/x-www-form-urlencoded
///
/// cf-turnstile-response=<token>
/// ```
///
/// Answers `{ "valid": bool }`. When Turnstile is disabled every token is
/// valid, so the frontend can call this unconditionally.

use crate::{app::AppState, error::ApiResult, middleware::client_ip::ClientIp, response::success};
use axum::{extract::State, Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
pub struct TurnstileForm {
    #[serde(rename = "cf-turnstile-response", default)]
    pub token: String,
}

pub async fn verify(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    form: Option<Form<TurnstileForm>>,
) -> ApiResult<Json<Value>> {
    let form = form.map(|Form(f)| f).unwrap_or_default();

    let valid = state.turnstile.verify(&form.token, &ip).await?;
    if !valid {
        tracing::debug!(ip = %ip, "Turnstile token rejected");
    }

    Ok(success("Turnstile token checked", json!({ "valid": valid })))
}
