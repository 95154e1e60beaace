//! Payment processor client (Mercado Pago REST API).
//!
//! ```text
//! POST /api/pagos/qr ──► create_preference ──► init_point (QR / checkout link)
//!
//! processor ──► POST /api/pagos/webhook?restauranteId=..
//!                   │  verify x-signature (optional)
//!                   ▼
//!              fetch_payment(tenant token, data.id) ──► GatewayPayment
//! ```
//!
//! Every call uses the restaurant's own access token; there is no global
//! credential.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use mesa_core::payment::{GatewayPayment, GatewayPaymentStatus};

/// Gateway client errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("processor answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

/// One item of a checkout preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Checkout preference for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRequest {
    /// Sent as `external_reference`; the webhook settles this order.
    pub order_id: String,
    pub items: Vec<PreferenceItem>,
    pub notification_url: Option<String>,
}

/// Created preference. `init_point` is what the QR encodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub id: String,
    pub init_point: String,
}

/// Payment processor operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Looks up a payment by id with the tenant's access token.
    async fn fetch_payment(&self, access_token: &str, payment_id: &str) -> Result<GatewayPayment, GatewayError>;

    /// Creates a checkout preference with the tenant's access token.
    async fn create_preference(
        &self,
        access_token: &str,
        request: &PreferenceRequest,
    ) -> Result<Preference, GatewayError>;
}

// =============================================================================
// Mercado Pago
// =============================================================================

#[derive(Debug, Deserialize)]
struct MpPayment {
    id: serde_json::Value,
    status: GatewayPaymentStatus,
    #[serde(default)]
    external_reference: Option<String>,
    #[serde(default)]
    transaction_amount: f64,
    #[serde(default)]
    payment_method_id: Option<String>,
}

impl From<MpPayment> for GatewayPayment {
    fn from(raw: MpPayment) -> Self {
        let id = match raw.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };

        GatewayPayment {
            id,
            status: raw.status,
            external_reference: raw.external_reference,
            transaction_amount_cents: pesos_to_cents(raw.transaction_amount),
            payment_method_id: raw.payment_method_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MpPreference {
    id: String,
    init_point: String,
}

/// Mercado Pago REST client.
pub struct MercadoPagoGateway {
    client: Client,
    base_url: String,
}

impl MercadoPagoGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("HTTP client error: {e}")))?;

        Ok(MercadoPagoGateway {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(GatewayError::Status { status, body })
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    async fn fetch_payment(&self, access_token: &str, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        debug!(payment_id, "Fetching payment from processor");

        let resp = self
            .client
            .get(format!("{}/v1/payments/{}", self.base_url, payment_id))
            .bearer_auth(access_token)
            .send()
            .await?;

        let raw: MpPayment = Self::check(resp).await?.json().await?;
        Ok(raw.into())
    }

    async fn create_preference(
        &self,
        access_token: &str,
        request: &PreferenceRequest,
    ) -> Result<Preference, GatewayError> {
        let items: Vec<serde_json::Value> = request
            .items
            .iter()
            .map(|item| {
                serde_json::json!({
                    "title": item.title,
                    "quantity": item.quantity,
                    "unit_price": cents_to_pesos(item.unit_price_cents),
                    "currency_id": "ARS",
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "items": items,
            "external_reference": request.order_id,
        });
        if let Some(url) = &request.notification_url {
            body["notification_url"] = serde_json::Value::String(url.clone());
        }

        debug!(order_id = %request.order_id, "Creating checkout preference");

        let resp = self
            .client
            .post(format!("{}/checkout/preferences", self.base_url))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        let raw: MpPreference = Self::check(resp).await?.json().await?;
        Ok(Preference {
            id: raw.id,
            init_point: raw.init_point,
        })
    }
}

fn pesos_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

fn cents_to_pesos(cents: i64) -> f64 {
    cents as f64 / 100.0
}

// =============================================================================
// Webhook Signature
// =============================================================================

/// Checks an `x-signature` header (`ts=<ts>,v1=<hex>`).
///
/// The signed manifest is `id:{data_id};request-id:{request_id};ts:{ts};`.
pub fn verify_signature(secret: &str, signature: &str, request_id: &str, data_id: &str) -> bool {
    let mut ts = None;
    let mut v1 = None;
    for part in signature.split(',') {
        match part.trim().split_once('=') {
            Some(("ts", value)) => ts = Some(value.trim()),
            Some(("v1", value)) => v1 = Some(value.trim()),
            _ => {}
        }
    }

    let (Some(ts), Some(v1)) = (ts, v1) else {
        return false;
    };
    let Ok(expected) = hex::decode(v1) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(format!("id:{data_id};request-id:{request_id};ts:{ts};").as_bytes());
    mac.verify_slice(&expected).is_ok()
}
