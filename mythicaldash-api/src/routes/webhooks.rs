/// PayPal IPN receiver
///
/// # Endpoint
///
/// ```text
/// POST /api/webhooks/paypal
/// Content-Type: application/x-www-form-urlencoded
/// ```
///
/// PayPal retries deliveries until it gets a 2xx, so the response code is the
/// only thing that matters:
///
/// - `200`: processed, ignored, duplicate or forged (nothing to retry)
/// - `503`: verification or database unavailable (PayPal will redeliver)

use crate::app::AppState;
use axum::{extract::State, http::StatusCode};

pub async fn paypal_ipn(State(state): State<AppState>, body: String) -> StatusCode {
    match state.payments.handle_ipn(&body).await {
        Ok(outcome) => {
            tracing::debug!(outcome = ?outcome, "IPN handled");
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(error = %e, "IPN processing failed, asking PayPal to retry");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
