/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is loaded
/// first when present) into typed sections and validated once at startup.
///
/// # Environment Variables
///
/// | Variable                      | Default                          |
/// |-------------------------------|----------------------------------|
/// | `API_HOST`                    | `0.0.0.0`                        |
/// | `API_PORT`                    | `8080`                           |
/// | `APP_URL`                     | `http://localhost:8080`          |
/// | `CORS_ORIGINS`                | `*` (comma-separated)            |
/// | `STORAGE`                     | `postgres` (`memory` for demos)  |
/// | `DATABASE_URL`                | required with `postgres`         |
/// | `DATABASE_MAX_CONNECTIONS`    | `10`                             |
/// | `PAYPAL_ENABLED`              | `false`                          |
/// | `PAYPAL_BUSINESS_EMAIL`       | required when PayPal is enabled  |
/// | `PAYPAL_CURRENCY`             | `EUR`                            |
/// | `PAYPAL_SANDBOX`              | `false`                          |
/// | `PAYPAL_PRICE_PER_COIN`       | `0.01`                           |
/// | `PAYPAL_VERIFY_URL`           | PayPal's IPN endpoint            |
/// | `PTERODACTYL_URL`             | unset (panel lookups disabled)   |
/// | `PTERODACTYL_API_KEY`         | unset                            |
/// | `LICENSE_SERVICE_URL`         | `https://api.mythical.systems`   |
/// | `TURNSTILE_ENABLED`           | `false`                          |
/// | `TURNSTILE_SECRET_KEY`        | required when Turnstile is on    |
/// | `FRONTEND_DIST`               | `frontend/dist`                  |
///
/// # Example
///
/// ```no_run
/// use mythicaldash_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use mythicaldash_shared::integrations::captcha::{TurnstileConfig, TURNSTILE_VERIFY_URL};
use mythicaldash_shared::integrations::license::LicenseConfig;
use mythicaldash_shared::integrations::paypal::PayPalConfig;
use mythicaldash_shared::integrations::pterodactyl::PterodactylConfig;
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, str::FromStr};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub paypal: PayPalConfig,

    /// Application API access; `None` disables panel lookups
    pub pterodactyl: Option<PterodactylConfig>,

    pub license: LicenseConfig,
    pub turnstile: TurnstileConfig,
    pub frontend: FrontendConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Public base URL, used to build PayPal callback URLs
    pub app_url: String,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Where persistent state lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("Unknown STORAGE backend: {}", other),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,

    /// PostgreSQL connection URL (empty with the memory backend)
    pub url: String,

    pub max_connections: u32,
}

/// Frontend assets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Directory holding the built SPA (`index.html` plus assets)
    pub dist_dir: PathBuf,
}

fn parse_bool(key: &str, raw: Option<String>, default: bool) -> anyhow::Result<bool> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("FALSE") | Some("no") => Ok(false),
        Some(other) => anyhow::bail!("{} must be a boolean, got {:?}", key, other),
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to
    /// parse or validate.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let app_url = var("APP_URL", "http://localhost:8080")
            .trim_end_matches('/')
            .to_string();

        let api = ApiConfig {
            host: var("API_HOST", "0.0.0.0"),
            port: var("API_PORT", "8080").parse::<u16>()?,
            app_url: app_url.clone(),
            cors_origins: var("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        let backend: StorageBackend = var("STORAGE", "postgres").parse()?;
        let database_url = lookup("DATABASE_URL").unwrap_or_default();
        if backend == StorageBackend::Postgres && database_url.is_empty() {
            anyhow::bail!("DATABASE_URL environment variable is required");
        }

        let database = DatabaseConfig {
            backend,
            url: database_url,
            max_connections: var("DATABASE_MAX_CONNECTIONS", "10").parse::<u32>()?,
        };

        let paypal = PayPalConfig {
            enabled: parse_bool("PAYPAL_ENABLED", lookup("PAYPAL_ENABLED"), false)?,
            business_email: var("PAYPAL_BUSINESS_EMAIL", ""),
            currency: var("PAYPAL_CURRENCY", "EUR").to_ascii_uppercase(),
            sandbox: parse_bool("PAYPAL_SANDBOX", lookup("PAYPAL_SANDBOX"), false)?,
            price_per_coin: var("PAYPAL_PRICE_PER_COIN", "0.01").parse::<f64>()?,
            notify_url: format!("{}/api/webhooks/paypal", app_url),
            return_url: format!("{}/api/paypal/finish", app_url),
            cancel_url: format!("{}/dashboard", app_url),
            verify_url: lookup("PAYPAL_VERIFY_URL").filter(|v| !v.is_empty()),
        };

        if paypal.enabled {
            if paypal.business_email.is_empty() {
                anyhow::bail!("PAYPAL_BUSINESS_EMAIL is required when PayPal is enabled");
            }
            if !(paypal.price_per_coin.is_finite() && paypal.price_per_coin > 0.0) {
                anyhow::bail!("PAYPAL_PRICE_PER_COIN must be greater than zero");
            }
        }

        let pterodactyl = match (lookup("PTERODACTYL_URL"), lookup("PTERODACTYL_API_KEY")) {
            (Some(base_url), Some(api_key)) if !base_url.is_empty() && !api_key.is_empty() => {
                Some(PterodactylConfig { base_url, api_key })
            }
            _ => None,
        };

        let turnstile = TurnstileConfig {
            enabled: parse_bool("TURNSTILE_ENABLED", lookup("TURNSTILE_ENABLED"), false)?,
            secret_key: var("TURNSTILE_SECRET_KEY", ""),
            verify_url: var("TURNSTILE_VERIFY_URL", TURNSTILE_VERIFY_URL),
        };

        if turnstile.enabled && turnstile.secret_key.is_empty() {
            anyhow::bail!("TURNSTILE_SECRET_KEY is required when Turnstile is enabled");
        }

        Ok(Self {
            api,
            database,
            paypal,
            pterodactyl,
            license: LicenseConfig {
                base_url: var("LICENSE_SERVICE_URL", "https://api.mythical.systems"),
            },
            turnstile,
            frontend: FrontendConfig {
                dist_dir: PathBuf::from(var("FRONTEND_DIST", "frontend/dist")),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
