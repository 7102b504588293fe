/// Leaderboard queries
///
/// The requested kind is parsed before anything is read, so a bad `type`
/// never costs a settings or database round trip.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::authorization::{require_capability, AuthzError, Capability};
use crate::error::StoreError;
use crate::format::format_number;
use crate::models::leaderboard::{LeaderboardKind, LeaderboardStore};
use crate::models::setting::{keys, SettingsStore};
use crate::models::user::User;

pub const DEFAULT_LIMIT: i64 = 15;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("Unknown leaderboard type: {0}")]
    InvalidType(String),

    #[error("Leaderboard is disabled")]
    Disabled,

    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error("Leaderboard store error: {0}")]
    Store(#[from] StoreError),
}

/// One ranked row as returned to the frontend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub username: String,
    pub avatar: String,
    pub score: f64,
    pub score_formatted: String,
}

/// Only the literal `"false"` turns the leaderboard off
pub fn is_enabled(flag: Option<&str>) -> bool {
    flag != Some("false")
}

/// Row limit from the raw setting, clamped to `1..=MAX_LIMIT`
pub fn effective_limit(raw: Option<&str>) -> i64 {
    match raw.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(n) if n >= 1 => n.min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    }
}

#[derive(Clone)]
pub struct LeaderboardService {
    settings: Arc<dyn SettingsStore>,
    board: Arc<dyn LeaderboardStore>,
}

impl LeaderboardService {
    pub fn new(settings: Arc<dyn SettingsStore>, board: Arc<dyn LeaderboardStore>) -> Self {
        Self { settings, board }
    }

    pub async fn query(
        &self,
        viewer: &User,
        raw_kind: &str,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let kind: LeaderboardKind = raw_kind
            .parse()
            .map_err(|_| LeaderboardError::InvalidType(raw_kind.to_string()))?;

        require_capability(viewer, Capability::ViewLeaderboard)?;

        let flag = self.settings.get(keys::LEADERBOARD_ENABLED).await?;
        if !is_enabled(flag.as_deref()) {
            return Err(LeaderboardError::Disabled);
        }

        let limit = effective_limit(self.settings.get(keys::LEADERBOARD_LIMIT).await?.as_deref());

        let rows = self.board.top(kind, limit).await?;
        tracing::debug!(kind = %kind, limit, rows = rows.len(), "Leaderboard served");

        Ok(rows
            .into_iter()
            .take(limit as usize)
            .enumerate()
            .map(|(i, row)| LeaderboardEntry {
                rank: i + 1,
                score_formatted: format_number(row.score),
                username: row.username,
                avatar: row.avatar,
                score: row.score,
            })
            .collect())
    }
}
