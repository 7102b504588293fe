/// Coin purchases through PayPal
///
/// # Flow
///
/// ```text
/// GET /api/paypal/process?coins=N
///   -> validate N, create pending payment (random order code)
///   -> 302 to PayPal checkout (custom = order code)
///
/// POST /api/webhooks/paypal (IPN)
///   -> verify with PayPal (_notify-validate)
///   -> check receiver and currency
///   -> Completed: pending -> paid + credit coins (once)
///   -> Denied/Failed/Expired/Voided: pending -> failed
/// ```
///
/// Coins are only ever credited from a verified IPN, never from the buyer
/// returning to the finish page.

use std::sync::Arc;

use crate::auth::authorization::{require_capability, AuthzError, Capability};
use crate::error::StoreError;
use crate::integrations::paypal::{
    Checkout, IpnNotification, IpnPaymentStatus, IpnVerification, PayPalClient,
};
use crate::integrations::IntegrationError;
use crate::models::payment::{NewPayment, PaymentStore};
use crate::models::random_hex;
use crate::models::user::User;

/// Largest single order, in cents
pub const MAX_ORDER_CENTS: i64 = 100_000_000;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("PayPal payments are disabled")]
    Disabled,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error("Payment store error: {0}")]
    Store(#[from] StoreError),

    #[error("PayPal error: {0}")]
    Integration(#[from] IntegrationError),
}

/// What an IPN message did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpnOutcome {
    /// Payment settled and coins credited
    Credited,

    /// Payment marked failed
    Failed,

    /// Payment was already settled
    Duplicate,

    /// Authentic message with nothing to do
    Ignored,

    /// PayPal did not recognize the message
    Forged,
}

/// Parses the `coins` query value: a finite number greater than zero
pub fn parse_coins(raw: Option<&str>) -> Result<f64, PaymentError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(PaymentError::InvalidArgument("coins is required".to_string()));
    }

    match raw.parse::<f64>() {
        Ok(coins) if coins.is_finite() && coins > 0.0 => Ok(coins),
        _ => Err(PaymentError::InvalidArgument(format!(
            "coins must be a positive number, got {:?}",
            raw
        ))),
    }
}

/// Order total in cents, rejecting totals PayPal can't charge
fn order_cents(coins: f64, price_per_coin: f64) -> Result<i64, PaymentError> {
    let cents = (coins * price_per_coin * 100.0).round();
    if !cents.is_finite() || cents > MAX_ORDER_CENTS as f64 {
        return Err(PaymentError::InvalidArgument(
            "Order total exceeds the maximum charge".to_string(),
        ));
    }
    if cents < 1.0 {
        return Err(PaymentError::InvalidArgument(
            "Order total is below the minimum charge".to_string(),
        ));
    }

    Ok(cents as i64)
}

#[derive(Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentStore>,
    paypal: PayPalClient,
}

impl PaymentService {
    pub fn new(payments: Arc<dyn PaymentStore>, paypal: PayPalClient) -> Self {
        Self { payments, paypal }
    }

    /// Creates a pending payment and returns the PayPal URL to redirect to
    pub async fn start_checkout(
        &self,
        buyer: &User,
        raw_coins: Option<&str>,
    ) -> Result<String, PaymentError> {
        let config = self.paypal.config();
        if !config.enabled {
            return Err(PaymentError::Disabled);
        }

        let coins = parse_coins(raw_coins)?;
        require_capability(buyer, Capability::PurchaseCoins)?;

        let amount_cents = order_cents(coins, config.price_per_coin)?;

        let payment = self
            .payments
            .create_pending(NewPayment {
                code: random_hex(16),
                user_uuid: buyer.uuid,
                coins,
                amount_cents,
                currency: config.currency.clone(),
            })
            .await?;

        tracing::info!(
            user = %buyer.uuid,
            code = %payment.code,
            coins,
            amount_cents,
            "Starting PayPal checkout"
        );

        Ok(self.paypal.checkout_url(&Checkout {
            code: payment.code,
            coins,
            amount_cents,
        })?)
    }

    /// Applies an IPN message. Errors mean PayPal should redeliver.
    pub async fn handle_ipn(&self, raw_body: &str) -> Result<IpnOutcome, PaymentError> {
        if self.paypal.verify_ipn(raw_body).await? == IpnVerification::Invalid {
            tracing::warn!("Rejected IPN message that PayPal did not verify");
            return Ok(IpnOutcome::Forged);
        }

        let ipn = IpnNotification::parse(raw_body);
        let config = self.paypal.config();

        if !ipn.receiver_email.eq_ignore_ascii_case(&config.business_email)
            || !ipn.mc_currency.eq_ignore_ascii_case(&config.currency)
        {
            tracing::warn!(
                receiver = %ipn.receiver_email,
                currency = %ipn.mc_currency,
                txn_id = %ipn.txn_id,
                "IPN receiver or currency does not match configuration"
            );
            return Ok(IpnOutcome::Ignored);
        }

        if ipn.custom.is_empty() {
            return Ok(IpnOutcome::Ignored);
        }

        let Some(payment) = self.payments.find_by_code(&ipn.custom).await? else {
            tracing::warn!(code = %ipn.custom, txn_id = %ipn.txn_id, "IPN for unknown order");
            return Ok(IpnOutcome::Ignored);
        };

        if payment.status.is_terminal() {
            tracing::debug!(code = %payment.code, status = ?payment.status, "IPN for settled order");
            return Ok(IpnOutcome::Duplicate);
        }

        let transitioned = match ipn.status() {
            IpnPaymentStatus::Completed => {
                let paid_enough = ipn
                    .gross_cents()
                    .map_or(false, |gross| gross >= payment.amount_cents);
                if !paid_enough {
                    tracing::warn!(
                        code = %payment.code,
                        expected_cents = payment.amount_cents,
                        mc_gross = %ipn.mc_gross,
                        "IPN gross below order amount"
                    );
                    return Ok(IpnOutcome::Ignored);
                }
                self.payments.complete(&payment.code, &ipn.txn_id).await?
            }
            IpnPaymentStatus::Failed => self.payments.fail(&payment.code, &ipn.txn_id).await?,
            IpnPaymentStatus::Other => {
                tracing::debug!(code = %payment.code, status = %ipn.payment_status, "IPN status ignored");
                return Ok(IpnOutcome::Ignored);
            }
        };

        let outcome = match (transitioned, ipn.status()) {
            (false, _) => IpnOutcome::Duplicate,
            (true, IpnPaymentStatus::Completed) => IpnOutcome::Credited,
            (true, _) => IpnOutcome::Failed,
        };

        tracing::info!(
            code = %payment.code,
            user = %payment.user_uuid,
            txn_id = %ipn.txn_id,
            outcome = ?outcome,
            "IPN processed"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authorization::Role;
    use crate::db::memory::MemoryStore;
    use crate::integrations::paypal::PayPalConfig;
    use crate::integrations::test_support::spawn;
    use crate::models::payment::PaymentStatus;
    use crate::models::user::UserStore;
    use axum::{routing::post, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(verify_url: Option<String>) -> PayPalConfig {
        PayPalConfig {
            enabled: true,
            business_email: "shop@example.com".to_string(),
            currency: "EUR".to_string(),
            sandbox: true,
            price_per_coin: 0.01,
            notify_url: "https://dash.example.com/api/webhooks/paypal".to_string(),
            return_url: "https://dash.example.com/api/paypal/finish".to_string(),
            cancel_url: "https://dash.example.com/dashboard".to_string(),
            verify_url,
        }
    }

    /// Verification endpoint that accepts everything except bodies with `forged=1`
    async fn verifier(calls: Arc<AtomicUsize>) -> String {
        let router = Router::new().route(
            "/ipn",
            post(move |body: String| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if body.contains("forged=1") {
                        "INVALID"
                    } else {
                        "VERIFIED"
                    }
                }
            }),
        );
        format!("{}/ipn", spawn(router).await)
    }

    fn ipn(code: &str, status: &str, gross: &str) -> String {
        format!(
            "txn_id=TX{code}&payment_status={status}&receiver_email=shop%40example.com&mc_gross={gross}&mc_currency=EUR&custom={code}"
        )
    }

    async fn setup() -> (Arc<MemoryStore>, PaymentService, User, Arc<AtomicUsize>) {
        let store = Arc::new(MemoryStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let url = verifier(calls.clone()).await;
        let svc = PaymentService::new(store.clone(), PayPalClient::new(config(Some(url))));
        let buyer = store.insert_user(User::new("buyer", Role::Default)).await;
        (store, svc, buyer, calls)
    }

    async fn checkout(svc: &PaymentService, buyer: &User, coins: &str) -> String {
        let url = svc.start_checkout(buyer, Some(coins)).await.unwrap();
        url::Url::parse(&url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "custom")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn test_parse_coins() {
        assert_eq!(parse_coins(Some("250")).unwrap(), 250.0);
        assert_eq!(parse_coins(Some(" 12.5 ")).unwrap(), 12.5);
        for bad in [None, Some(""), Some("abc"), Some("0"), Some("-5"), Some("NaN"), Some("inf")] {
            assert!(matches!(parse_coins(bad), Err(PaymentError::InvalidArgument(_))), "{bad:?}");
        }
    }

    #[test]
    fn test_order_cents_bounds() {
        assert_eq!(order_cents(250.0, 0.01).unwrap(), 250);
        assert_eq!(order_cents(10_000.0, 100.0).unwrap(), MAX_ORDER_CENTS);
        assert!(matches!(order_cents(0.4, 0.01), Err(PaymentError::InvalidArgument(_))));
        assert!(matches!(order_cents(10_001.0, 100.0), Err(PaymentError::InvalidArgument(_))));
        assert!(matches!(order_cents(1e300, 1e300), Err(PaymentError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_huge_order_rejected() {
        let (store, svc, buyer, _) = setup().await;

        for coins in ["1e300", "100000000000"] {
            let err = svc.start_checkout(&buyer, Some(coins)).await.unwrap_err();
            assert!(matches!(err, PaymentError::InvalidArgument(_)), "{coins}");
        }
        assert_eq!(store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_coins_creates_nothing() {
        let (store, svc, buyer, calls) = setup().await;

        let err = svc.start_checkout(&buyer, None).await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidArgument(_)));
        assert_eq!(store.payment_count().await, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_paypal() {
        let store = Arc::new(MemoryStore::new());
        let mut cfg = config(None);
        cfg.enabled = false;
        let svc = PaymentService::new(store.clone(), PayPalClient::new(cfg));
        let buyer = User::new("buyer", Role::Default);

        assert!(matches!(
            svc.start_checkout(&buyer, Some("100")).await,
            Err(PaymentError::Disabled)
        ));
        assert_eq!(store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn test_checkout_creates_pending_payment() {
        let (store, svc, buyer, _) = setup().await;

        let code = checkout(&svc, &buyer, "250").await;
        assert_eq!(code.len(), 32);

        let payment = store.find_by_code(&code).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount_cents, 250);
        assert_eq!(payment.coins, 250.0);
        assert_eq!(payment.user_uuid, buyer.uuid);
    }

    #[tokio::test]
    async fn test_tiny_order_rejected() {
        let (store, svc, buyer, _) = setup().await;
        let err = svc.start_checkout(&buyer, Some("0.1")).await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidArgument(_)));
        assert_eq!(store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_ipn_credits_once() {
        let (store, svc, buyer, _) = setup().await;
        let code = checkout(&svc, &buyer, "500").await;
        let body = ipn(&code, "Completed", "5.00");

        assert_eq!(svc.handle_ipn(&body).await.unwrap(), IpnOutcome::Credited);
        assert_eq!(svc.handle_ipn(&body).await.unwrap(), IpnOutcome::Duplicate);

        let user = store.find_by_uuid(buyer.uuid).await.unwrap().unwrap();
        assert_eq!(user.coins, 500.0);
        let payment = store.find_by_code(&code).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_concurrent_ipn_credits_once() {
        let (store, svc, buyer, _) = setup().await;
        let code = checkout(&svc, &buyer, "100").await;
        let body = ipn(&code, "Completed", "1.00");

        let (a, b) = tokio::join!(svc.handle_ipn(&body), svc.handle_ipn(&body));
        let outcomes = [a.unwrap(), b.unwrap()];
        assert_eq!(outcomes.iter().filter(|o| **o == IpnOutcome::Credited).count(), 1);

        let user = store.find_by_uuid(buyer.uuid).await.unwrap().unwrap();
        assert_eq!(user.coins, 100.0);
    }

    #[tokio::test]
    async fn test_forged_ipn_changes_nothing() {
        let (store, svc, buyer, calls) = setup().await;
        let code = checkout(&svc, &buyer, "100").await;
        let body = format!("{}&forged=1", ipn(&code, "Completed", "1.00"));

        assert_eq!(svc.handle_ipn(&body).await.unwrap(), IpnOutcome::Forged);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let payment = store.find_by_code(&code).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_mismatched_receiver_or_underpayment_ignored() {
        let (store, svc, buyer, _) = setup().await;
        let code = checkout(&svc, &buyer, "100").await;

        let wrong_receiver = ipn(&code, "Completed", "1.00").replace("shop%40example.com", "evil%40example.com");
        assert_eq!(svc.handle_ipn(&wrong_receiver).await.unwrap(), IpnOutcome::Ignored);

        let wrong_currency = ipn(&code, "Completed", "1.00").replace("mc_currency=EUR", "mc_currency=USD");
        assert_eq!(svc.handle_ipn(&wrong_currency).await.unwrap(), IpnOutcome::Ignored);

        let underpaid = ipn(&code, "Completed", "0.50");
        assert_eq!(svc.handle_ipn(&underpaid).await.unwrap(), IpnOutcome::Ignored);

        let unknown = ipn("doesnotexist", "Completed", "1.00");
        assert_eq!(svc.handle_ipn(&unknown).await.unwrap(), IpnOutcome::Ignored);

        let payment = store.find_by_code(&code).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_failure_statuses() {
        let (store, svc, buyer, _) = setup().await;

        let pending = checkout(&svc, &buyer, "100").await;
        assert_eq!(
            svc.handle_ipn(&ipn(&pending, "Pending", "1.00")).await.unwrap(),
            IpnOutcome::Ignored
        );

        let denied = checkout(&svc, &buyer, "100").await;
        assert_eq!(
            svc.handle_ipn(&ipn(&denied, "Denied", "1.00")).await.unwrap(),
            IpnOutcome::Failed
        );
        assert_eq!(
            svc.handle_ipn(&ipn(&denied, "Completed", "1.00")).await.unwrap(),
            IpnOutcome::Duplicate
        );

        let payment = store.find_by_code(&denied).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);
        let user = store.find_by_uuid(buyer.uuid).await.unwrap().unwrap();
        assert_eq!(user.coins, 0.0);
    }

    #[tokio::test]
    async fn test_ipn_without_txn_id_settles_each_order() {
        let (store, svc, buyer, _) = setup().await;

        for _ in 0..2 {
            let code = checkout(&svc, &buyer, "100").await;
            let body = ipn(&code, "Failed", "1.00").replace(&format!("txn_id=TX{code}&"), "");

            assert_eq!(svc.handle_ipn(&body).await.unwrap(), IpnOutcome::Failed);
            let payment = store.find_by_code(&code).await.unwrap().unwrap();
            assert_eq!(payment.provider_txn_id, None);
        }
    }

    #[tokio::test]
    async fn test_verification_outage_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let svc = PaymentService::new(
            store,
            PayPalClient::new(config(Some("http://127.0.0.1:1/ipn".to_string()))),
        );

        let err = svc.handle_ipn("custom=abc").await.unwrap_err();
        assert!(matches!(err, PaymentError::Integration(IntegrationError::Transport(_))));
    }

    #[tokio::test]
    async fn test_store_outage_is_an_error() {
        let (store, svc, buyer, _) = setup().await;
        let code = checkout(&svc, &buyer, "100").await;

        store.fail_writes(true);
        let err = svc.handle_ipn(&ipn(&code, "Completed", "1.00")).await.unwrap_err();
        assert!(matches!(err, PaymentError::Store(_)));
    }
}
