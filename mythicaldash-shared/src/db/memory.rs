/// In-memory store implementation
///
/// Implements every store trait over process-local maps. It backs the test
/// suites of both crates and lets the API run without PostgreSQL for local
/// frontend work (`STORAGE=memory`).
///
/// Besides the trait methods it exposes a few hooks for tests:
/// - read counters, to assert that a code path never touched the data
/// - [`MemoryStore::fail_writes`], to simulate a database outage

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::activity::{Activity, ActivityStore, NewActivity};
use crate::models::leaderboard::{LeaderboardKind, LeaderboardStore, RankedUser};
use crate::models::payment::{stored_txn_id, NewPayment, Payment, PaymentStatus, PaymentStore};
use crate::models::setting::SettingsStore;
use crate::models::user::{User, UserStore};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    referrals: HashMap<Uuid, u64>,
    settings: BTreeMap<String, String>,
    activities: Vec<Activity>,
    payments: HashMap<String, Payment>,
}

/// Process-local implementation of every store trait
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    settings_reads: AtomicUsize,
    leaderboard_reads: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user and returns it
    pub async fn insert_user(&self, user: User) -> User {
        self.inner.lock().await.users.insert(user.uuid, user.clone());
        user
    }

    /// Records that `referrer` brought in one more user
    pub async fn add_referral(&self, referrer: Uuid) {
        *self.inner.lock().await.referrals.entry(referrer).or_insert(0) += 1;
    }

    /// Number of payments created so far
    pub async fn payment_count(&self) -> usize {
        self.inner.lock().await.payments.len()
    }

    /// Number of settings reads served so far
    pub fn settings_reads(&self) -> usize {
        self.settings_reads.load(Ordering::SeqCst)
    }

    /// Number of leaderboard reads served so far
    pub fn leaderboard_reads(&self) -> usize {
        self.leaderboard_reads.load(Ordering::SeqCst)
    }

    /// Makes every subsequent write fail with `StoreError::Unavailable`
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.token == token).cloned())
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.lock().await.users.get(&uuid).cloned())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.settings_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.lock().await.settings.get(key).cloned())
    }

    async fn all(&self) -> StoreResult<BTreeMap<String, String>> {
        self.settings_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.lock().await.settings.clone())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check_writable()?;
        self.inner
            .lock()
            .await
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn record(&self, entry: NewActivity) -> StoreResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.lock().await;
        let id = inner.activities.len() as i64 + 1;
        inner.activities.push(Activity {
            id,
            user_uuid: entry.user_uuid,
            action: entry.action,
            ip: entry.ip,
            context: entry.context,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent_for_user(&self, user_uuid: Uuid, limit: i64) -> StoreResult<Vec<Activity>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .activities
            .iter()
            .rev()
            .filter(|a| a.user_uuid == user_uuid)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LeaderboardStore for MemoryStore {
    async fn top(&self, kind: LeaderboardKind, limit: i64) -> StoreResult<Vec<RankedUser>> {
        self.leaderboard_reads.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().await;

        let mut rows: Vec<RankedUser> = inner
            .users
            .values()
            .filter(|u| !u.banned)
            .filter_map(|u| {
                let score = match kind {
                    LeaderboardKind::Coins => u.coins,
                    LeaderboardKind::MinutesAfk => u.minutes_afk as f64,
                    LeaderboardKind::Referrals => *inner.referrals.get(&u.uuid)? as f64,
                };
                Some(RankedUser {
                    username: u.username.clone(),
                    avatar: u.avatar.clone(),
                    score,
                })
            })
            .collect();

        rows.sort_by(|a, b| b.score.total_cmp(&a.score));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn create_pending(&self, data: NewPayment) -> StoreResult<Payment> {
        self.check_writable()?;
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            code: data.code,
            user_uuid: data.user_uuid,
            coins: data.coins,
            amount_cents: data.amount_cents,
            currency: data.currency,
            status: PaymentStatus::Pending,
            provider_txn_id: None,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .lock()
            .await
            .payments
            .insert(payment.code.clone(), payment.clone());
        Ok(payment)
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Payment>> {
        Ok(self.inner.lock().await.payments.get(code).cloned())
    }

    async fn complete(&self, code: &str, provider_txn_id: &str) -> StoreResult<bool> {
        self.check_writable()?;
        // Single lock scope: status check, transition and credit are atomic.
        let mut inner = self.inner.lock().await;

        let (user_uuid, coins) = match inner.payments.get_mut(code) {
            Some(p) if p.status == PaymentStatus::Pending => {
                p.status = PaymentStatus::Paid;
                p.provider_txn_id = stored_txn_id(provider_txn_id).map(str::to_string);
                p.updated_at = Utc::now();
                (p.user_uuid, p.coins)
            }
            _ => return Ok(false),
        };

        let user = inner
            .users
            .get_mut(&user_uuid)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_uuid)))?;
        user.coins += coins;

        Ok(true)
    }

    async fn fail(&self, code: &str, provider_txn_id: &str) -> StoreResult<bool> {
        self.check_writable()?;
        let mut inner = self.inner.lock().await;

        match inner.payments.get_mut(code) {
            Some(p) if p.status == PaymentStatus::Pending => {
                p.status = PaymentStatus::Failed;
                p.provider_txn_id = stored_txn_id(provider_txn_id).map(str::to_string);
                p.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authorization::Role;

    fn pending(code: &str, user: Uuid) -> NewPayment {
        NewPayment {
            code: code.to_string(),
            user_uuid: user,
            coins: 500.0,
            amount_cents: 500,
            currency: "EUR".to_string(),
        }
    }

    #[tokio::test]
    async fn test_settings_upsert() {
        let store = MemoryStore::new();
        store.set("app_name", "Old").await.unwrap();
        store.set("app_name", "New").await.unwrap();

        assert_eq!(store.get("app_name").await.unwrap().as_deref(), Some("New"));
        assert_eq!(store.all().await.unwrap().len(), 1);
        assert_eq!(store.settings_reads(), 2);
    }

    #[tokio::test]
    async fn test_failed_writes_leave_state_untouched() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        assert!(matches!(
            store.set("k", "v").await,
            Err(StoreError::Unavailable(_))
        ));

        store.fail_writes(false);
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_credits_once() {
        let store = MemoryStore::new();
        let user = store.insert_user(User::new("payer", Role::Default)).await;
        store.create_pending(pending("order-1", user.uuid)).await.unwrap();

        assert!(store.complete("order-1", "TXN1").await.unwrap());
        assert!(!store.complete("order-1", "TXN1").await.unwrap());
        assert!(!store.fail("order-1", "TXN1").await.unwrap());

        let user = store.find_by_uuid(user.uuid).await.unwrap().unwrap();
        assert_eq!(user.coins, 500.0);

        let payment = store.find_by_code("order-1").await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.provider_txn_id.as_deref(), Some("TXN1"));
    }

    #[tokio::test]
    async fn test_unknown_payment_is_not_completed() {
        let store = MemoryStore::new();
        assert!(!store.complete("missing", "TXN").await.unwrap());
    }

    #[tokio::test]
    async fn test_leaderboard_orders_and_skips_banned() {
        let store = MemoryStore::new();
        for (name, coins, banned) in [("a", 10.0, false), ("b", 30.0, false), ("c", 99.0, true)] {
            let mut user = User::new(name, Role::Default);
            user.coins = coins;
            user.banned = banned;
            store.insert_user(user).await;
        }

        let rows = store.top(LeaderboardKind::Coins, 10).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_referral_board_only_lists_referrers() {
        let store = MemoryStore::new();
        let referrer = store.insert_user(User::new("inviter", Role::Default)).await;
        store.insert_user(User::new("lurker", Role::Default)).await;
        store.add_referral(referrer.uuid).await;
        store.add_referral(referrer.uuid).await;

        let rows = store.top(LeaderboardKind::Referrals, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, 2.0);
    }
}
