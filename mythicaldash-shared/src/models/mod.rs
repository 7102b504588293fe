/// Database models for MythicalDash
///
/// Each model module defines the record type, a store trait describing the
/// operations the rest of the system needs, and the PostgreSQL implementation
/// of that trait on [`crate::db::PgStore`]. The in-memory implementation lives
/// in [`crate::db::memory`].
///
/// # Models
///
/// - `user`: Dashboard accounts resolved from session tokens
/// - `setting`: Key/value configuration edited from the admin area
/// - `activity`: Audit trail of user actions
/// - `leaderboard`: Read-only ranking projections over users
/// - `payment`: PayPal coin purchases
///
/// # Example
///
/// ```no_run
/// use mythicaldash_shared::db::PgStore;
/// use mythicaldash_shared::db::pool::{create_pool, DatabaseConfig};
/// use mythicaldash_shared::models::setting::SettingsStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
///
/// store.set("app_name", "MythicalDash").await?;
/// let all = store.all().await?;
/// # Ok(())
/// # }
/// ```

pub mod activity;
pub mod leaderboard;
pub mod payment;
pub mod setting;
pub mod user;

/// Generates a random lowercase hex string from `bytes` random bytes
pub fn random_hex(bytes: usize) -> String {
    use rand::RngCore;

    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}
