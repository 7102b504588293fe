/// License service lookups
///
/// License keys are validated by an external service. The dashboard only
/// relays the service's answer; it never stores or mutates a key.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ensure_success, http_client, normalize_base_url, IntegrationError, IntegrationResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// License service URL, e.g. `https://license.mythical.systems`
    pub base_url: String,
}

/// Looks up license information for a key
#[async_trait]
pub trait LicenseChecker: Send + Sync {
    async fn check(&self, key: &str) -> IntegrationResult<Value>;
}

/// HTTP implementation of [`LicenseChecker`]
#[derive(Debug, Clone)]
pub struct LicenseClient {
    http: reqwest::Client,
    base_url: String,
}

impl LicenseClient {
    pub fn new(config: LicenseConfig) -> Self {
        Self {
            http: http_client(Duration::from_secs(10)),
            base_url: normalize_base_url(&config.base_url),
        }
    }
}

#[async_trait]
impl LicenseChecker for LicenseClient {
    async fn check(&self, key: &str) -> IntegrationResult<Value> {
        let key = key.trim();
        if key.is_empty() {
            return Err(IntegrationError::InvalidResponse(
                "License key is empty".to_string(),
            ));
        }

        // Keys go into a path segment, so encode anything unusual
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|_| IntegrationError::NotConfigured("license base_url"))?;
        url.path_segments_mut()
            .map_err(|_| IntegrationError::NotConfigured("license base_url"))?
            .pop_if_empty()
            .extend(["api", "license", key]);

        tracing::debug!(url = %url, "Checking license");

        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|e| IntegrationError::InvalidResponse(format!("License service returned invalid JSON: {}", e)))
    }
}
