//! Processor checkout, processor webhook, and the payments summary.
//!
//! ## Webhook
//! ```text
//! POST /api/pagos/webhook?restauranteId=..
//!   1. x-signature check           (only when payments.webhook_secret is set) ─► 401
//!   2. type != "payment"           ─► 200 {"status":"ignored"}
//!   3. tenant access token         ─► 404 when missing
//!   4. fetch_payment (once)        ─► 502 on gateway failure
//!   5. record_gateway_payment      ─► 200 {"status":"duplicate"} on redelivery
//!      approved + reference        ─► settle that order (+ clear table if configured)
//!   6. stock decrement for the settled lines
//! ```

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::gateway::{verify_signature, Preference, PreferenceItem, PreferenceRequest};
use crate::routes::{decrement_after_sale, Tenant};
use crate::AppState;
use mesa_core::inventory::StockPlan;
use mesa_core::payment::WebhookNotification;
use mesa_core::summary::{compute_summary, PaymentsSummary, SummaryInput};
use mesa_core::{CoreError, OrderKind};
use mesa_db::GatewayRecord;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrRequest {
    pub order_id: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    #[serde(flatten)]
    pub record: GatewayRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<StockPlan>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub desde: Option<DateTime<Utc>>,
}

async fn access_token(state: &AppState, restaurant_id: &str) -> Result<String, ApiError> {
    let restaurant = state
        .db
        .restaurants()
        .get(restaurant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Restaurant not found: {restaurant_id}")))?;

    restaurant
        .gateway_access_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::NotFound("Payment processor is not configured".to_string()))
}

/// `POST /api/pagos/qr`: checkout preference whose reference is the order id.
pub async fn create_qr(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<QrRequest>,
) -> Result<Json<Preference>, ApiError> {
    let token = access_token(&state, &rid).await?;

    let order = state
        .db
        .orders()
        .get(&rid, &body.order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(body.order_id.clone()))?;

    if order.is_paid() {
        return Err(CoreError::InvalidOrderStatus {
            order_id: order.id,
            current_status: order.status.to_string(),
        }
        .into());
    }
    if order.lines.is_empty() {
        return Err(CoreError::EmptyOrder(order.id).into());
    }

    let request = PreferenceRequest {
        order_id: order.id.clone(),
        items: order
            .lines
            .iter()
            .map(|line| PreferenceItem {
                title: line.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
            })
            .collect(),
        notification_url: state
            .config
            .payments
            .notification_url
            .as_ref()
            .map(|url| format!("{url}?restauranteId={rid}")),
    };

    let preference = state.gateway.create_preference(&token, &request).await?;
    info!(restaurant_id = %rid, order_id = %order.id, preference_id = %preference.id, "Checkout created");
    Ok(Json(preference))
}

/// `POST /api/pagos/webhook`
pub async fn webhook(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if let Some(secret) = state.config.payments.webhook_secret.as_deref() {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default();
        let data_id = match body.pointer("/data/id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        if !verify_signature(secret, header("x-signature"), header("x-request-id"), &data_id) {
            warn!(restaurant_id = %rid, "Webhook signature mismatch");
            return Err(ApiError::Unauthenticated("Invalid webhook signature".to_string()));
        }
    }

    let notification = match serde_json::from_value::<WebhookNotification>(body) {
        Ok(n) if n.is_payment() => n,
        _ => return Ok(Json(json!({ "status": "ignored" }))),
    };

    let token = access_token(&state, &rid).await?;
    let payment = state.gateway.fetch_payment(&token, &notification.data.id).await?;
    info!(
        restaurant_id = %rid,
        payment_id = %payment.id,
        status = %payment.status,
        "Processor payment fetched"
    );

    let record = state
        .db
        .ledger()
        .record_gateway_payment(&rid, &payment, state.config.payments.liberate_tables_on_payment)
        .await?;

    let stock = match &record {
        GatewayRecord::Recorded {
            settlement: Some(settlement),
            ..
        } => decrement_after_sale(&state, &rid, &settlement.ticket.lines).await,
        _ => None,
    };

    let response = WebhookResponse { record, stock };
    serde_json::to_value(&response)
        .map(Json)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// `GET /api/pagos-resumen`
///
/// Incomes, expenses and tickets are limited to `desde` when given; virtual
/// movements always cover the full balance.
pub async fn summary(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<PaymentsSummary>, ApiError> {
    let since = query.desde;
    let (registers, ledger, orders) = (state.db.registers(), state.db.ledger(), state.db.orders());

    let fetched = tokio::try_join!(
        registers.current(&rid),
        ledger.virtual_movements(&rid, None),
        ledger.list_incomes(&rid, since),
        ledger.list_expenses(&rid, since),
        orders.tickets(&rid, Some(OrderKind::Mesa), since),
        orders.tickets(&rid, Some(OrderKind::Takeaway), since),
        orders.tickets(&rid, Some(OrderKind::Delivery), since),
    );

    let (open_register, virtual_movements, incomes, expenses, mesa, takeaway, delivery) = match fetched {
        Ok(inputs) => inputs,
        Err(e) => {
            error!(restaurant_id = %rid, error = %e, "Payments summary fetch failed");
            return Err(e.into());
        }
    };

    let input = SummaryInput {
        open_register,
        virtual_movements,
        incomes,
        expenses,
        mesa_tickets: mesa,
        takeaway_tickets: takeaway,
        delivery_tickets: delivery,
    };

    Ok(Json(compute_summary(input, state.config.summary.recent_limit)))
}
