/// Setting model and database operations
///
/// Settings are untyped key/value pairs edited from the admin area. Values are
/// always strings; callers parse them where they need a number or flag.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE settings (
///     key VARCHAR(255) PRIMARY KEY,
///     value TEXT NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::PgStore;
use crate::error::StoreResult;

/// Well-known setting keys
pub mod keys {
    /// `"false"` disables the leaderboard
    pub const LEADERBOARD_ENABLED: &str = "leaderboard_enabled";

    /// Maximum number of leaderboard rows
    pub const LEADERBOARD_LIMIT: &str = "leaderboard_limit";
}

/// A single persisted setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Key/value access to persisted settings
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads a single value
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Reads every setting, ordered by key
    async fn all(&self) -> StoreResult<BTreeMap<String, String>>;

    /// Inserts or replaces a value
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    async fn all(&self) -> StoreResult<BTreeMap<String, String>> {
        let rows = sqlx::query_as::<_, Setting>("SELECT key, value FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|s| (s.key, s.value)).collect())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
