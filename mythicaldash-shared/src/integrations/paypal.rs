/// PayPal Standard checkout and IPN (Instant Payment Notification) support
///
/// Checkout is a plain redirect to PayPal's `_xclick` page carrying our order
/// code in `custom`. PayPal later POSTs an IPN message to the webhook; its
/// authenticity is established by echoing the raw body back to PayPal with
/// `cmd=_notify-validate` prepended and reading `VERIFIED` or `INVALID`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

use super::{ensure_success, http_client, IntegrationError, IntegrationResult};

pub const LIVE_CHECKOUT_URL: &str = "https://www.paypal.com/cgi-bin/webscr";
pub const SANDBOX_CHECKOUT_URL: &str = "https://www.sandbox.paypal.com/cgi-bin/webscr";
pub const LIVE_VERIFY_URL: &str = "https://ipnpb.paypal.com/cgi-bin/webscr";
pub const SANDBOX_VERIFY_URL: &str = "https://ipnpb.sandbox.paypal.com/cgi-bin/webscr";

/// PayPal settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPalConfig {
    pub enabled: bool,

    /// Merchant account receiving payments (`business` / `receiver_email`)
    pub business_email: String,

    /// ISO currency code, e.g. `EUR`
    pub currency: String,

    pub sandbox: bool,

    /// Price of a single coin in `currency`
    pub price_per_coin: f64,

    /// Public URL of `POST /api/webhooks/paypal`
    pub notify_url: String,

    /// Where PayPal sends the buyer after paying
    pub return_url: String,

    /// Where PayPal sends the buyer after cancelling
    pub cancel_url: String,

    /// Overrides the IPN verification endpoint (local testing)
    #[serde(default)]
    pub verify_url: Option<String>,
}

impl PayPalConfig {
    pub fn checkout_base(&self) -> &str {
        if self.sandbox {
            SANDBOX_CHECKOUT_URL
        } else {
            LIVE_CHECKOUT_URL
        }
    }

    pub fn verify_endpoint(&self) -> &str {
        match &self.verify_url {
            Some(url) => url,
            None if self.sandbox => SANDBOX_VERIFY_URL,
            None => LIVE_VERIFY_URL,
        }
    }
}

/// One checkout to send the buyer to
#[derive(Debug, Clone)]
pub struct Checkout {
    pub code: String,
    pub coins: f64,
    pub amount_cents: i64,
}

/// Result of asking PayPal about an IPN message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpnVerification {
    Verified,
    Invalid,
}

/// How a `payment_status` value affects a pending order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpnPaymentStatus {
    Completed,
    Failed,
    Other,
}

/// Fields of an IPN message we act on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IpnNotification {
    pub txn_id: String,
    pub payment_status: String,
    pub receiver_email: String,
    pub mc_gross: String,
    pub mc_currency: String,
    pub custom: String,
}

impl IpnNotification {
    /// Parses a form-encoded IPN body; unknown fields are ignored
    pub fn parse(raw: &str) -> Self {
        let mut n = Self::default();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            let slot = match key.as_ref() {
                "txn_id" => &mut n.txn_id,
                "payment_status" => &mut n.payment_status,
                "receiver_email" => &mut n.receiver_email,
                "mc_gross" => &mut n.mc_gross,
                "mc_currency" => &mut n.mc_currency,
                "custom" => &mut n.custom,
                _ => continue,
            };
            *slot = value.into_owned();
        }
        n
    }

    pub fn status(&self) -> IpnPaymentStatus {
        match self.payment_status.as_str() {
            "Completed" => IpnPaymentStatus::Completed,
            "Denied" | "Failed" | "Expired" | "Voided" => IpnPaymentStatus::Failed,
            _ => IpnPaymentStatus::Other,
        }
    }

    /// Gross amount in cents, if `mc_gross` is a valid number
    pub fn gross_cents(&self) -> Option<i64> {
        let gross: f64 = self.mc_gross.trim().parse().ok()?;
        gross.is_finite().then(|| (gross * 100.0).round() as i64)
    }
}

/// Formats cents as a PayPal amount (`12.50`)
pub fn format_amount(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

/// PayPal client
#[derive(Debug, Clone)]
pub struct PayPalClient {
    config: PayPalConfig,
    http: reqwest::Client,
}

impl PayPalClient {
    pub fn new(config: PayPalConfig) -> Self {
        Self {
            config,
            http: http_client(Duration::from_secs(30)),
        }
    }

    pub fn config(&self) -> &PayPalConfig {
        &self.config
    }

    /// Builds the `_xclick` URL the buyer is redirected to
    pub fn checkout_url(&self, checkout: &Checkout) -> IntegrationResult<String> {
        let item_name = format!("{} coins", checkout.coins);
        let amount = format_amount(checkout.amount_cents);

        let url = Url::parse_with_params(
            self.config.checkout_base(),
            &[
                ("cmd", "_xclick"),
                ("business", self.config.business_email.as_str()),
                ("item_name", item_name.as_str()),
                ("amount", amount.as_str()),
                ("currency_code", self.config.currency.as_str()),
                ("custom", checkout.code.as_str()),
                ("notify_url", self.config.notify_url.as_str()),
                ("return", self.config.return_url.as_str()),
                ("cancel_return", self.config.cancel_url.as_str()),
            ],
        )
        .map_err(|e| IntegrationError::InvalidResponse(format!("Bad checkout URL: {}", e)))?;

        Ok(url.into())
    }

    /// Echoes an IPN body back to PayPal, byte-for-byte, for verification
    pub async fn verify_ipn(&self, raw_body: &str) -> IntegrationResult<IpnVerification> {
        let body = format!("cmd=_notify-validate&{}", raw_body);

        let response = self
            .http
            .post(self.config.verify_endpoint())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await?;

        let text = ensure_success(response).await?.text().await?;

        match text.trim() {
            "VERIFIED" => Ok(IpnVerification::Verified),
            "INVALID" => Ok(IpnVerification::Invalid),
            other => Err(IntegrationError::InvalidResponse(format!(
                "Unexpected IPN verification reply: {}",
                other.chars().take(100).collect::<String>()
            ))),
        }
    }
}
