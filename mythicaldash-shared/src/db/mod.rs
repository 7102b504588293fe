/// Database layer for MythicalDash
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Embedded migration runner
/// - `memory`: In-memory store used by tests and local demos
///
/// Store traits are defined next to their models in [`crate::models`]; the
/// PostgreSQL implementations are written against [`PgStore`].
///
/// # Example
///
/// ```no_run
/// use mythicaldash_shared::db::{PgStore, pool::{create_pool, DatabaseConfig}};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let store = PgStore::new(create_pool(config).await?);
///     Ok(())
/// }
/// ```

pub mod memory;
pub mod migrations;
pub mod pool;

use sqlx::PgPool;

/// PostgreSQL-backed implementation of every store trait
#[derive(Debug, Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for health checks and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
