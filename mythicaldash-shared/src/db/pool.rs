/// PostgreSQL pool setup
///
/// One pool is built at startup, probed once with `SELECT 1`, and shared by
/// every [`PgStore`](crate::db::PgStore). The health endpoint reads
/// [`PoolStats`] from it and shutdown drains it with [`close_pool`].
///
/// ```no_run
/// use mythicaldash_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let pool = create_pool(DatabaseConfig::from_url("postgresql://localhost/mythicaldash", 10)).await?;
/// // ... serve requests ...
/// close_pool(pool).await;
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Pool sizing and connection recycling
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,

    /// Connections kept open while the dashboard is idle
    pub min_connections: u32,

    /// How long a request waits for a free connection
    pub acquire_timeout: Duration,

    /// `None` keeps idle connections forever
    pub idle_timeout: Option<Duration>,

    /// `None` never recycles connections by age
    pub max_lifetime: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

impl DatabaseConfig {
    /// `url` and pool size from the environment, defaults for the rest
    pub fn from_url(url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            url: url.into(),
            max_connections,
            ..Default::default()
        }
    }

    /// Pool options before connecting
    pub fn options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections.min(self.max_connections))
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
    }
}

/// Connects and verifies the database answers
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
        "Connecting to PostgreSQL"
    );

    let pool = config.options().connect(&config.url).await?;
    health_check(&pool).await?;

    info!("PostgreSQL pool ready");
    Ok(pool)
}

/// Round-trips `SELECT 1`
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    if one != 1 {
        return Err(sqlx::Error::Protocol(format!("SELECT 1 returned {}", one)));
    }

    debug!("Database answered health probe");
    Ok(())
}

/// Connection counts shown by `GET /health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub active_connections: usize,
    pub idle_connections: usize,
    pub total_connections: usize,
}

impl PoolStats {
    /// From the pool's own counters
    pub fn of(pool: &PgPool) -> Self {
        Self::from_counts(pool.size(), pool.num_idle())
    }

    /// `size` is reported as `u32` and `idle` as `usize` by sqlx
    pub fn from_counts(size: u32, idle: usize) -> Self {
        let total = size as usize;
        Self {
            active_connections: total.saturating_sub(idle),
            idle_connections: idle.min(total),
            total_connections: total,
        }
    }
}

/// Waits for checked-out connections to return, then closes them
pub async fn close_pool(pool: PgPool) {
    let stats = PoolStats::of(&pool);
    info!(active = stats.active_connections, "Closing PostgreSQL pool");
    pool.close().await;
}
