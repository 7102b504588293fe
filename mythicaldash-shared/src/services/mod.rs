/// Business operations built on the store traits
///
/// # Modules
///
/// - [`settings`]: Admin settings gate (validate, authorize, persist, notify, audit)
/// - [`leaderboard`]: Ranked user listings controlled by settings
/// - [`payments`]: PayPal coin purchases and IPN handling
///
/// Services hold `Arc<dyn Store>` handles so the same code runs against
/// PostgreSQL in production and [`crate::db::memory::MemoryStore`] in tests.

pub mod leaderboard;
pub mod payments;
pub mod settings;
