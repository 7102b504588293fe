/// Pterodactyl panel API clients
///
/// Pterodactyl exposes two APIs with separate keys:
///
/// - **Application API** (`/api/application/*`, `ptla_` keys): panel-wide
///   administration, wrapped by [`PterodactylApplicationClient`]
/// - **Client API** (`/api/client/*`, `ptlc_` keys): acts as one panel user,
///   wrapped by [`PterodactylClient`]
///
/// Both send bearer-authenticated JSON requests and return the decoded JSON
/// body untouched. Callers pick the fields they need.
///
/// # Example
///
/// ```no_run
/// use mythicaldash_shared::integrations::pterodactyl::{PterodactylApplicationClient, PterodactylConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = PterodactylApplicationClient::new(PterodactylConfig {
///     base_url: "https://panel.example.com".to_string(),
///     api_key: "ptla_xxx".to_string(),
/// });
///
/// let user = client.get_user(42).await?;
/// println!("{}", user["attributes"]["username"]);
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use reqwest::{header, Method};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use url::Url;

use super::{ensure_success, http_client, normalize_base_url, IntegrationError, IntegrationResult};

/// Connection settings for one Pterodactyl API key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PterodactylConfig {
    /// Panel URL, e.g. `https://panel.example.com`
    pub base_url: String,

    /// Application or client API key
    pub api_key: String,
}

/// Shared request plumbing for both APIs
#[derive(Debug, Clone)]
struct PanelHttp {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PanelHttp {
    fn new(config: PterodactylConfig) -> Self {
        Self {
            http: http_client(Duration::from_secs(15)),
            base_url: normalize_base_url(&config.base_url),
            api_key: config.api_key,
        }
    }

    /// Panel URL for `segments`, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> IntegrationResult<Url> {
        let mut url =
            Url::parse(&self.base_url).map_err(|_| IntegrationError::NotConfigured("pterodactyl base_url"))?;
        url.path_segments_mut()
            .map_err(|_| IntegrationError::NotConfigured("pterodactyl base_url"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn page(&self, segments: &[&str], page: u32) -> IntegrationResult<Url> {
        let mut url = self.endpoint(segments)?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> IntegrationResult<Value> {
        tracing::debug!(method = %method, url = %url, "Pterodactyl request");

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = ensure_success(request.send().await?).await?;

        // DELETE endpoints answer 204 with no body
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            IntegrationError::InvalidResponse(format!("Pterodactyl returned invalid JSON: {}", e))
        })
    }
}

/// Input for creating a panel account
#[derive(Debug, Clone, Serialize)]
pub struct CreatePanelUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Application (admin) API wrapper
#[derive(Debug, Clone)]
pub struct PterodactylApplicationClient {
    inner: PanelHttp,
}

impl PterodactylApplicationClient {
    pub fn new(config: PterodactylConfig) -> Self {
        Self {
            inner: PanelHttp::new(config),
        }
    }

    /// Fetches one panel user
    pub async fn get_user(&self, id: u64) -> IntegrationResult<Value> {
        let url = self.inner.endpoint(&["api", "application", "users", &id.to_string()])?;
        self.inner.send(Method::GET, url, None).await
    }

    /// Lists panel users, one page at a time
    pub async fn list_users(&self, page: u32) -> IntegrationResult<Value> {
        let url = self.inner.page(&["api", "application", "users"], page)?;
        self.inner.send(Method::GET, url, None).await
    }

    /// Creates a panel user
    pub async fn create_user(&self, user: &CreatePanelUser) -> IntegrationResult<Value> {
        let body = serde_json::to_value(user).map_err(|e| {
            IntegrationError::InvalidResponse(format!("Failed to encode user: {}", e))
        })?;
        let url = self.inner.endpoint(&["api", "application", "users"])?;
        self.inner.send(Method::POST, url, Some(body)).await
    }

    /// Deletes a panel user
    pub async fn delete_user(&self, id: u64) -> IntegrationResult<Value> {
        let url = self.inner.endpoint(&["api", "application", "users", &id.to_string()])?;
        self.inner.send(Method::DELETE, url, None).await
    }

    /// Lists servers, one page at a time
    pub async fn list_servers(&self, page: u32) -> IntegrationResult<Value> {
        let url = self.inner.page(&["api", "application", "servers"], page)?;
        self.inner.send(Method::GET, url, None).await
    }
}

/// Client API wrapper, acting as the key's owner
#[derive(Debug, Clone)]
pub struct PterodactylClient {
    inner: PanelHttp,
}

impl PterodactylClient {
    pub fn new(config: PterodactylConfig) -> Self {
        Self {
            inner: PanelHttp::new(config),
        }
    }

    /// Account details of the key owner
    pub async fn get_account(&self) -> IntegrationResult<Value> {
        let url = self.inner.endpoint(&["api", "client", "account"])?;
        self.inner.send(Method::GET, url, None).await
    }

    /// Lists the owner's API keys
    pub async fn list_api_keys(&self) -> IntegrationResult<Value> {
        let url = self.inner.endpoint(&["api", "client", "account", "api-keys"])?;
        self.inner.send(Method::GET, url, None).await
    }

    /// Creates an API key; the secret is only present in this response
    pub async fn create_api_key(&self, description: &str, allowed_ips: &[String]) -> IntegrationResult<Value> {
        let url = self.inner.endpoint(&["api", "client", "account", "api-keys"])?;
        self.inner
            .send(
                Method::POST,
                url,
                Some(json!({ "description": description, "allowed_ips": allowed_ips })),
            )
            .await
    }

    /// Deletes an API key by identifier
    pub async fn delete_api_key(&self, identifier: &str) -> IntegrationResult<Value> {
        let url = self.inner.endpoint(&["api", "client", "account", "api-keys", identifier])?;
        self.inner.send(Method::DELETE, url, None).await
    }
}
