/// Activity (audit log) model
///
/// Every privileged change records who did it, from which IP, and a short
/// human-readable context line.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE activities (
///     id BIGSERIAL PRIMARY KEY,
///     user_uuid UUID NOT NULL REFERENCES users(uuid) ON DELETE CASCADE,
///     action VARCHAR(64) NOT NULL,
///     ip VARCHAR(64) NOT NULL,
///     context TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::StoreResult;

/// Action name recorded for settings changes
pub const SETTINGS_UPDATE: &str = "settings_update";

/// Recorded activity entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    pub user_uuid: Uuid,
    pub action: String,
    pub ip: String,
    pub context: String,
    pub created_at: DateTime<Utc>,
}

/// Input for recording an activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub user_uuid: Uuid,
    pub action: String,
    pub ip: String,
    pub context: String,
}

/// Append-only audit log
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Appends an entry
    async fn record(&self, entry: NewActivity) -> StoreResult<()>;

    /// Lists a user's most recent entries, newest first
    async fn recent_for_user(&self, user_uuid: Uuid, limit: i64) -> StoreResult<Vec<Activity>>;
}

#[async_trait]
impl ActivityStore for PgStore {
    async fn record(&self, entry: NewActivity) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activities (user_uuid, action, ip, context)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.user_uuid)
        .bind(entry.action)
        .bind(entry.ip)
        .bind(entry.context)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_for_user(&self, user_uuid: Uuid, limit: i64) -> StoreResult<Vec<Activity>> {
        let entries = sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, user_uuid, action, ip, context, created_at
            FROM activities
            WHERE user_uuid = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_uuid)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
