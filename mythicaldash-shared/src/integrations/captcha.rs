/// Cloudflare Turnstile verification

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ensure_success, http_client, IntegrationError, IntegrationResult};

pub const TURNSTILE_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnstileConfig {
    pub enabled: bool,
    pub secret_key: String,

    #[serde(default = "default_verify_url")]
    pub verify_url: String,
}

fn default_verify_url() -> String {
    TURNSTILE_VERIFY_URL.to_string()
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Checks Turnstile tokens submitted with forms
#[derive(Debug, Clone)]
pub struct TurnstileValidator {
    config: TurnstileConfig,
    http: reqwest::Client,
}

impl TurnstileValidator {
    pub fn new(config: TurnstileConfig) -> Self {
        Self {
            config,
            http: http_client(Duration::from_secs(10)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Returns whether `token` is a valid, unused challenge response.
    ///
    /// A disabled validator accepts everything; an empty token is rejected
    /// without contacting Cloudflare.
    pub async fn verify(&self, token: &str, remote_ip: &str) -> IntegrationResult<bool> {
        if !self.config.enabled {
            return Ok(true);
        }
        if token.trim().is_empty() {
            return Ok(false);
        }

        let response = self
            .http
            .post(&self.config.verify_url)
            .form(&[
                ("secret", self.config.secret_key.as_str()),
                ("response", token),
                ("remoteip", remote_ip),
            ])
            .send()
            .await?;

        let body: SiteVerifyResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| IntegrationError::InvalidResponse(format!("Turnstile reply: {}", e)))?;

        if !body.success {
            tracing::debug!(errors = ?body.error_codes, "Turnstile rejected token");
        }

        Ok(body.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::test_support::spawn;
    use axum::{routing::post, Form, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn validator(enabled: bool, verify_url: String) -> TurnstileValidator {
        TurnstileValidator::new(TurnstileConfig {
            enabled,
            secret_key: "secret".to_string(),
            verify_url,
        })
    }

    async fn siteverify() -> String {
        let router = Router::new().route(
            "/siteverify",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                let ok = form.get("secret").map(String::as_str) == Some("secret")
                    && form.get("response").map(String::as_str) == Some("good-token")
                    && form.get("remoteip").map(String::as_str) == Some("203.0.113.9");
                if ok {
                    Json(json!({"success": true}))
                } else {
                    Json(json!({"success": false, "error-codes": ["invalid-input-response"]}))
                }
            }),
        );
        format!("{}/siteverify", spawn(router).await)
    }

    #[tokio::test]
    async fn test_valid_and_invalid_tokens() {
        let v = validator(true, siteverify().await);
        assert!(v.verify("good-token", "203.0.113.9").await.unwrap());
        assert!(!v.verify("bad-token", "203.0.113.9").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_token_skips_network() {
        // Unroutable URL: any request would error
        let v = validator(true, "http://127.0.0.1:1/siteverify".to_string());
        assert!(!v.verify("", "203.0.113.9").await.unwrap());
    }

    #[tokio::test]
    async fn test_disabled_accepts_everything() {
        let v = validator(false, "http://127.0.0.1:1/siteverify".to_string());
        assert!(!v.is_enabled());
        assert!(v.verify("", "0.0.0.0").await.unwrap());
    }
}
