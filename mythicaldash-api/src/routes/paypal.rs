/// PayPal checkout redirects
///
/// # Endpoints
///
/// - `GET /api/paypal/process?coins=N` - Starts a checkout
/// - `GET /api/paypal/finish` - Buyer returns from PayPal
///
/// These are browser navigations, not XHR calls, so every outcome is a
/// `302`: to PayPal on success, to `/error?message=...` on failure.

use crate::{
    app::AppState,
    middleware::session::optional_user,
    response::{error_redirect, found},
};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
};
use mythicaldash_shared::services::payments::PaymentError;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ProcessQuery {
    pub coins: Option<String>,
}

/// Starts a coin purchase
pub async fn process(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Option<Query<ProcessQuery>>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();

    let user = match optional_user(&state, &headers).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_redirect("You must be logged in to purchase coins"),
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed during checkout");
            return error_redirect("The service is temporarily unavailable");
        }
    };

    match state.payments.start_checkout(&user, query.coins.as_deref()).await {
        Ok(url) => found(&url),
        Err(e) => {
            tracing::warn!(user = %user.uuid, error = %e, "PayPal checkout failed");
            let message = match e {
                PaymentError::Store(_) | PaymentError::Integration(_) => {
                    "The service is temporarily unavailable".to_string()
                }
                other => other.to_string(),
            };
            error_redirect(&message)
        }
    }
}

/// Landing page after PayPal; crediting happens via IPN, not here
pub async fn finish() -> Response {
    found("/dashboard")
}
