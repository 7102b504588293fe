/// User model and database operations
///
/// Users are created by the registration flow. This system reads them to
/// resolve sessions and credits coins to them after confirmed payments.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     uuid UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(64) NOT NULL UNIQUE,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     avatar VARCHAR(512) NOT NULL DEFAULT '',
///     role_id INTEGER NOT NULL DEFAULT 1,
///     coins DOUBLE PRECISION NOT NULL DEFAULT 0,
///     minutes_afk BIGINT NOT NULL DEFAULT 0,
///     pterodactyl_user_id BIGINT,
///     token VARCHAR(128) NOT NULL UNIQUE,
///     banned BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::authorization::Role;
use crate::db::PgStore;
use crate::error::StoreResult;

/// User model representing a dashboard account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Public user id
    pub uuid: Uuid,

    /// Unique display name
    pub username: String,

    /// Email address
    pub email: String,

    /// Avatar URL (may be empty)
    pub avatar: String,

    /// Stored role id, see [`Role::from_id`]
    pub role_id: i32,

    /// Coin balance
    pub coins: f64,

    /// Minutes spent on the AFK page
    pub minutes_afk: i64,

    /// Linked Pterodactyl account id
    pub pterodactyl_user_id: Option<i64>,

    /// Session token, never serialized into responses
    #[serde(skip_serializing)]
    pub token: String,

    /// Whether the account is banned
    pub banned: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds an unsaved user with a fresh uuid and session token
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@users.mythicaldash.local", username),
            avatar: String::new(),
            role_id: role.id(),
            coins: 0.0,
            minutes_afk: 0,
            pterodactyl_user_id: None,
            token: super::random_hex(32),
            banned: false,
            created_at: Utc::now(),
        }
    }

    /// Role derived from `role_id`
    pub fn role(&self) -> Role {
        Role::from_id(self.role_id)
    }
}

/// Read access to users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds the user owning a session token
    async fn find_by_token(&self, token: &str) -> StoreResult<Option<User>>;

    /// Finds a user by uuid
    async fn find_by_uuid(&self, uuid: Uuid) -> StoreResult<Option<User>>;
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT uuid, username, email, avatar, role_id, coins, minutes_afk,
                   pterodactyl_user_id, token, banned, created_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT uuid, username, email, avatar, role_id, coins, minutes_afk,
                   pterodactyl_user_id, token, banned, created_at
            FROM users
            WHERE uuid = $1
            "#,
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
