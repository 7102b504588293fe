/// Payment model and database operations
///
/// A payment row is created `pending` when the user starts a PayPal checkout
/// and moves to `paid` or `failed` exactly once, driven by IPN callbacks.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE payment_status AS ENUM ('pending', 'paid', 'failed');
///
/// CREATE TABLE payments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     code VARCHAR(64) NOT NULL UNIQUE,
///     user_uuid UUID NOT NULL REFERENCES users(uuid) ON DELETE CASCADE,
///     coins DOUBLE PRECISION NOT NULL,
///     amount_cents BIGINT NOT NULL,
///     currency VARCHAR(3) NOT NULL,
///     status payment_status NOT NULL DEFAULT 'pending',
///     provider_txn_id VARCHAR(64) UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # State Transitions
///
/// ```text
/// pending ──(IPN Completed)──> paid     (coins credited in the same transaction)
///    │
///    └────(IPN Denied/Failed)─> failed
/// ```
///
/// Transitions only apply to rows still `pending`, which makes repeated IPN
/// deliveries no-ops.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::StoreResult;

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// Coin purchase record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,

    /// Order code sent to PayPal in the `custom` field
    pub code: String,

    pub user_uuid: Uuid,

    /// Coins credited on success
    pub coins: f64,

    /// Charged amount in minor currency units
    pub amount_cents: i64,

    pub currency: String,

    pub status: PaymentStatus,

    /// PayPal transaction id, set when the IPN settles the payment
    pub provider_txn_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a pending payment
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub code: String,
    pub user_uuid: Uuid,
    pub coins: f64,
    pub amount_cents: i64,
    pub currency: String,
}

/// Persistence for coin purchases
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Creates a `pending` payment
    async fn create_pending(&self, data: NewPayment) -> StoreResult<Payment>;

    /// Finds a payment by order code
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Payment>>;

    /// Moves a pending payment to `paid` and credits its coins to the owner
    ///
    /// Returns `true` only for the call that performed the transition.
    async fn complete(&self, code: &str, provider_txn_id: &str) -> StoreResult<bool>;

    /// Moves a pending payment to `failed`
    ///
    /// Returns `true` only for the call that performed the transition.
    async fn fail(&self, code: &str, provider_txn_id: &str) -> StoreResult<bool>;
}

/// Stored form of a provider transaction id
///
/// PayPal omits `txn_id` on some notifications. An empty id is stored as
/// NULL so it never collides with the unique index.
pub(crate) fn stored_txn_id(provider_txn_id: &str) -> Option<&str> {
    let trimmed = provider_txn_id.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

const PAYMENT_COLUMNS: &str = "id, code, user_uuid, coins, amount_cents, currency, status, provider_txn_id, created_at, updated_at";

#[async_trait]
impl PaymentStore for PgStore {
    async fn create_pending(&self, data: NewPayment) -> StoreResult<Payment> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (code, user_uuid, coins, amount_cents, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(data.code)
        .bind(data.user_uuid)
        .bind(data.coins)
        .bind(data.amount_cents)
        .bind(data.currency)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE code = $1",
            PAYMENT_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn complete(&self, code: &str, provider_txn_id: &str) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        // The status guard makes this the single point where a payment can be
        // credited; concurrent deliveries serialize on the row lock.
        let settled: Option<(Uuid, f64)> = sqlx::query_as(
            r#"
            UPDATE payments
            SET status = 'paid', provider_txn_id = $2, updated_at = NOW()
            WHERE code = $1 AND status = 'pending'
            RETURNING user_uuid, coins
            "#,
        )
        .bind(code)
        .bind(stored_txn_id(provider_txn_id))
        .fetch_optional(&mut *tx)
        .await?;

        let Some((user_uuid, coins)) = settled else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query("UPDATE users SET coins = coins + $2, updated_at = NOW() WHERE uuid = $1")
            .bind(user_uuid)
            .bind(coins)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    async fn fail(&self, code: &str, provider_txn_id: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'failed', provider_txn_id = $2, updated_at = NOW()
            WHERE code = $1 AND status = 'pending'
            "#,
        )
        .bind(code)
        .bind(stored_txn_id(provider_txn_id))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Paid.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }

    #[test]
    fn test_empty_txn_id_stored_as_null() {
        assert_eq!(stored_txn_id(""), None);
        assert_eq!(stored_txn_id("  "), None);
        assert_eq!(stored_txn_id(" 9XY12 "), Some("9XY12"));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&PaymentStatus::Paid).unwrap(), "\"paid\"");
    }
}
