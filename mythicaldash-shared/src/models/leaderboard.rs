/// Leaderboard projections
///
/// Leaderboards are read-only rankings computed from the `users` table (and
/// `referral_uses` for the referral board). Banned users are excluded.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::PgStore;
use crate::error::StoreResult;

/// Supported leaderboard kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardKind {
    /// Ranked by coin balance
    Coins,

    /// Ranked by minutes spent on the AFK page
    MinutesAfk,

    /// Ranked by number of referred users
    Referrals,
}

impl LeaderboardKind {
    /// All kinds, in display order
    pub const ALL: [LeaderboardKind; 3] = [
        LeaderboardKind::Coins,
        LeaderboardKind::MinutesAfk,
        LeaderboardKind::Referrals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardKind::Coins => "coins",
            LeaderboardKind::MinutesAfk => "minutes_afk",
            LeaderboardKind::Referrals => "referrals",
        }
    }

    fn query(&self) -> &'static str {
        match self {
            LeaderboardKind::Coins => {
                r#"
                SELECT username, avatar, coins AS score
                FROM users
                WHERE banned = FALSE
                ORDER BY coins DESC
                LIMIT $1
                "#
            }
            LeaderboardKind::MinutesAfk => {
                r#"
                SELECT username, avatar, minutes_afk::DOUBLE PRECISION AS score
                FROM users
                WHERE banned = FALSE
                ORDER BY minutes_afk DESC
                LIMIT $1
                "#
            }
            LeaderboardKind::Referrals => {
                r#"
                SELECT u.username, u.avatar, COUNT(r.id)::DOUBLE PRECISION AS score
                FROM users u
                JOIN referral_uses r ON r.referrer_uuid = u.uuid
                WHERE u.banned = FALSE
                GROUP BY u.uuid, u.username, u.avatar
                ORDER BY score DESC
                LIMIT $1
                "#
            }
        }
    }
}

impl fmt::Display for LeaderboardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown leaderboard kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown leaderboard type: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for LeaderboardKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeaderboardKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Raw ranking row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RankedUser {
    pub username: String,
    pub avatar: String,
    pub score: f64,
}

/// Read access to rankings
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// Returns at most `limit` users ordered by descending score
    async fn top(&self, kind: LeaderboardKind, limit: i64) -> StoreResult<Vec<RankedUser>>;
}

#[async_trait]
impl LeaderboardStore for PgStore {
    async fn top(&self, kind: LeaderboardKind, limit: i64) -> StoreResult<Vec<RankedUser>> {
        let rows = sqlx::query_as::<_, RankedUser>(kind.query())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
