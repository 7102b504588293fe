/// Third-party service clients
///
/// # Modules
///
/// - [`pterodactyl`]: Pterodactyl application (admin) and client API wrappers
/// - [`paypal`]: PayPal checkout URLs and IPN verification
/// - [`license`]: External license service lookups
/// - [`captcha`]: Cloudflare Turnstile token verification
///
/// All clients share the same error type and never retry: a failed call is
/// reported to the caller, which decides whether to log, redirect or fail.

pub mod captcha;
pub mod license;
pub mod paypal;
pub mod pterodactyl;

use std::time::Duration;

/// Error type for third-party calls
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    /// Request never produced a response (DNS, TLS, timeout, ...)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Remote answered with a non-success status
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Remote answered with something we couldn't interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Integration is missing required configuration
    #[error("Integration not configured: {0}")]
    NotConfigured(&'static str),
}

/// Integration result type alias
pub type IntegrationResult<T> = Result<T, IntegrationError>;

const USER_AGENT: &str = concat!("MythicalDash/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client used by every integration
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

/// Turns a non-success response into `IntegrationError::Status`
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> IntegrationResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(IntegrationError::Status {
        status: status.as_u16(),
        body: body.chars().take(500).collect(),
    })
}

/// Strips trailing slashes so paths can be appended with `format!`
pub(crate) fn normalize_base_url(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("https://panel.example.com/"), "https://panel.example.com");
        assert_eq!(normalize_base_url("https://panel.example.com"), "https://panel.example.com");
    }

    #[test]
    fn test_status_error_display() {
        let err = IntegrationError::Status {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected status 404: not found");
    }
}
