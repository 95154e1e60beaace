//! # Payment Module
//!
//! Cash settlement and the decisions taken on processor notifications.
//!
//! ## Webhook Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/pagos/webhook { type, data: { id } }                         │
//! │        │                                                                │
//! │        ├── type != "payment" ──► ignored                                │
//! │        ▼                                                                │
//! │  fetch payment (tenant credential) ──► GatewayPayment                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  decide()                                                               │
//! │   ├── approved + external_reference ──► Settle { order_id, amount }     │
//! │   └── anything else ─────────────────► Record (log only)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A payment that is not approved never settles an order.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Cash
// =============================================================================

/// Outcome of a cash payment at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CashSettlement {
    pub total: Money,
    pub tendered: Money,
    /// Vuelto handed back to the customer.
    pub change: Money,
}

/// Computes change for a cash payment.
///
/// ## Example
/// ```rust
/// use mesa_core::{payment::settle_cash, Money};
///
/// let s = settle_cash(Money::from_cents(8_500), Money::from_cents(10_000)).unwrap();
/// assert_eq!(s.change.cents(), 1_500);
/// assert!(settle_cash(Money::from_cents(8_500), Money::from_cents(5_000)).is_err());
/// ```
pub fn settle_cash(total: Money, tendered: Money) -> CoreResult<CashSettlement> {
    if tendered < total {
        return Err(CoreError::InsufficientTender {
            total: total.cents(),
            tendered: tendered.cents(),
        });
    }

    Ok(CashSettlement {
        total,
        tendered,
        change: tendered - total,
    })
}

// =============================================================================
// Processor Notifications
// =============================================================================

/// Body of a processor notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookNotification {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookData {
    /// The processor sends this as a number or a string.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

impl WebhookNotification {
    pub fn is_payment(&self) -> bool {
        self.kind == "payment"
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Payment status as reported by the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GatewayPaymentStatus {
    Approved,
    Pending,
    InProcess,
    Rejected,
    Cancelled,
    Refunded,
    #[serde(other)]
    Other,
}

impl GatewayPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayPaymentStatus::Approved => "approved",
            GatewayPaymentStatus::Pending => "pending",
            GatewayPaymentStatus::InProcess => "in_process",
            GatewayPaymentStatus::Rejected => "rejected",
            GatewayPaymentStatus::Cancelled => "cancelled",
            GatewayPaymentStatus::Refunded => "refunded",
            GatewayPaymentStatus::Other => "other",
        }
    }
}

impl fmt::Display for GatewayPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment as fetched from the processor, amounts already in centavos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GatewayPayment {
    pub id: String,
    pub status: GatewayPaymentStatus,
    /// Order id set when the checkout preference was created.
    pub external_reference: Option<String>,
    pub transaction_amount_cents: i64,
    pub payment_method_id: Option<String>,
}

/// What to do with a fetched payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDecision {
    /// Mark the referenced order paid.
    Settle { order_id: String, amount: Money },
    /// Log the transaction only.
    Record,
}

pub fn decide(payment: &GatewayPayment) -> WebhookDecision {
    let reference = payment
        .external_reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    match (payment.status, reference) {
        (GatewayPaymentStatus::Approved, Some(order_id)) => WebhookDecision::Settle {
            order_id: order_id.to_string(),
            amount: Money::from_cents(payment.transaction_amount_cents),
        },
        _ => WebhookDecision::Record,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
