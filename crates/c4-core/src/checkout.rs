//! # Hosted Checkout Signing
//!
//! Builds the form payload the browser posts to the ABA PayWay hosted
//! checkout page, and signs it.
//!
//! ## Signature
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  signing fields (fixed order)                                           │
//! │    merchant_id | order_id | amount | currency | items |                 │
//! │    return_url  | cancel_url                                             │
//! │                                                                         │
//! │  1. take each value as a string                                         │
//! │  2. drop empty values                                                   │
//! │  3. join with "|"                                                       │
//! │  4. hash = hex( HMAC-SHA512(key = api_key, msg = joined) )              │
//! │                                                                         │
//! │  Same inputs + same config ⇒ same hash. Change any field ⇒ new hash.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Customer name/email/phone travel in the payload but are NOT signed.

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha512;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::CustomerDetails;

type HmacSha512 = Hmac<Sha512>;

/// Separator between signed values.
pub const SIGNING_DELIMITER: &str = "|";

/// Payload fields covered by the signature, in signing order.
pub const SIGNING_FIELDS: [&str; 7] = [
    "merchant_id",
    "order_id",
    "amount",
    "currency",
    "items",
    "return_url",
    "cancel_url",
];

const PLACEHOLDER_PREFIX: &str = "YOUR_";

// =============================================================================
// Configuration
// =============================================================================

/// Gateway credentials and URLs.
#[derive(Debug, Clone, Default)]
pub struct PaywayConfig {
    pub merchant_id: String,
    pub api_key: String,
    pub checkout_url: String,
    pub return_url: String,
    pub cancel_url: String,
    pub currency: String,
}

impl PaywayConfig {
    /// Fails fast on absent or placeholder settings.
    pub fn validate(&self) -> CoreResult<()> {
        if is_unset(&self.merchant_id) {
            return Err(misconfigured("merchant ID has not been configured"));
        }
        if is_unset(&self.api_key) {
            return Err(misconfigured("API key has not been configured"));
        }
        check_url("checkout endpoint", &self.checkout_url)?;
        check_url("return", &self.return_url)?;
        check_url("cancel", &self.cancel_url)?;
        Ok(())
    }
}

fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.starts_with(PLACEHOLDER_PREFIX)
}

fn check_url(name: &str, url: &str) -> CoreResult<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(misconfigured(&format!("{name} URL is missing")));
    }
    if is_placeholder_url(url) {
        return Err(misconfigured(&format!("{name} URL is still a placeholder ({url})")));
    }
    Ok(())
}

/// Not http(s), a `YOUR_...` template, or a loopback host the gateway
/// cannot reach.
fn is_placeholder_url(url: &str) -> bool {
    let lowered = url.to_ascii_lowercase();
    let Some(rest) = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
    else {
        return true;
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit_once(':').map_or(authority, |(host, _)| host);

    lowered.contains("your_")
        || lowered.contains("yourdomain")
        || matches!(host, "" | "localhost" | "127.0.0.1" | "0.0.0.0")
}

fn misconfigured(reason: &str) -> CoreError {
    CoreError::Configuration(format!("ABA PayWay {reason}"))
}

// =============================================================================
// Payload
// =============================================================================

/// Optional customer fields echoed to the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<&CustomerDetails> for CheckoutCustomer {
    fn from(details: &CustomerDetails) -> Self {
        CheckoutCustomer {
            name: details.name.clone().or_else(|| details.full_name.clone()),
            email: details.email.clone(),
            phone: details.phone.clone(),
        }
    }
}

/// The form fields posted to the hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutPayload {
    pub merchant_id: String,
    pub order_id: String,
    /// Two-decimal string, e.g. `"19.98"`.
    pub amount: String,
    pub currency: String,
    pub items: String,
    pub return_url: String,
    pub cancel_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub hash: String,
}

impl CheckoutPayload {
    /// Values of the signed fields, in [`SIGNING_FIELDS`] order.
    fn signing_values(&self) -> [&str; 7] {
        [
            self.merchant_id.as_str(),
            self.order_id.as_str(),
            self.amount.as_str(),
            self.currency.as_str(),
            self.items.as_str(),
            self.return_url.as_str(),
            self.cancel_url.as_str(),
        ]
    }

    /// The canonical string the hash is computed over.
    pub fn signing_string(&self) -> String {
        self.signing_values()
            .into_iter()
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(SIGNING_DELIMITER)
    }
}

/// Where to post, and what.
#[derive(Debug, Clone, Serialize)]
pub struct Checkout {
    pub endpoint: String,
    pub payload: CheckoutPayload,
}

// =============================================================================
// Signer
// =============================================================================

/// Signs checkout payloads with a validated configuration.
#[derive(Debug, Clone)]
pub struct CheckoutSigner {
    config: PaywayConfig,
}

impl CheckoutSigner {
    /// Creates a signer, rejecting incomplete configuration up front.
    pub fn new(config: PaywayConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(CheckoutSigner { config })
    }

    /// Builds and signs the checkout payload for an order.
    ///
    /// ## Example
    /// ```rust
    /// use c4_core::checkout::{CheckoutSigner, PaywayConfig};
    /// use c4_core::money::Money;
    ///
    /// let signer = CheckoutSigner::new(PaywayConfig {
    ///     merchant_id: "M-1".into(),
    ///     api_key: "secret".into(),
    ///     checkout_url: "https://gateway.example/checkout".into(),
    ///     return_url: "https://shop.example/payment/success".into(),
    ///     cancel_url: "https://shop.example/cancel".into(),
    ///     ..Default::default()
    /// })
    /// .unwrap();
    ///
    /// let checkout = signer
    ///     .build_checkout("ORDER-1", Money::from_cents(1998), "Plan", None)
    ///     .unwrap();
    /// assert_eq!(checkout.payload.amount, "19.98");
    /// assert_eq!(checkout.payload.currency, "USD");
    /// assert_eq!(checkout.payload.hash.len(), 128);
    /// ```
    pub fn build_checkout(
        &self,
        order_id: &str,
        amount: Money,
        items: &str,
        customer: Option<&CheckoutCustomer>,
    ) -> CoreResult<Checkout> {
        let currency = if self.config.currency.trim().is_empty() {
            crate::DEFAULT_CURRENCY.to_string()
        } else {
            self.config.currency.clone()
        };

        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

        let mut payload = CheckoutPayload {
            merchant_id: self.config.merchant_id.clone(),
            order_id: order_id.to_string(),
            amount: amount.to_decimal_string(),
            currency,
            items: items.to_string(),
            return_url: self.config.return_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
            customer_name: customer.and_then(|c| non_empty(&c.name)),
            customer_email: customer.and_then(|c| non_empty(&c.email)),
            customer_phone: customer.and_then(|c| non_empty(&c.phone)),
            hash: String::new(),
        };
        payload.hash = self.sign(&payload.signing_string())?;

        Ok(Checkout {
            endpoint: self.config.checkout_url.clone(),
            payload,
        })
    }

    /// hex(HMAC-SHA512(api_key, message)).
    pub fn sign(&self, message: &str) -> CoreResult<String> {
        let mut mac = HmacSha512::new_from_slice(self.config.api_key.as_bytes())
            .map_err(|_| misconfigured("API key cannot be used as an HMAC key"))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
