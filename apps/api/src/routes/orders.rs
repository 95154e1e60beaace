//! Tables, takeaway and delivery orders, their payment, and the ticket archive.
//!
//! ```text
//! POST /ordenes ──► POST /ordenes/{id}/productos ... ──► POST /ordenes/{id}/pagar
//!                                                            │ cash: tender ≥ total
//!                                                            ▼
//!                                  ticket + venta income (+ virtual movement)
//!                                                            │
//!                                                            ▼
//!                                                   stock decrement
//! POST /ordenes/{id}/liberar ──► mesa back to libre (ticket stays)
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::{decrement_after_sale, Tenant};
use crate::AppState;
use mesa_core::inventory::StockPlan;
use mesa_core::payment::{settle_cash, CashSettlement};
use mesa_core::validation::validate_name;
use mesa_core::{
    CoreError, Customer, Money, Order, OrderKind, OrderLine, OrderStatus, PaymentMethod, Ticket,
    ValidationError,
};
use mesa_db::Settlement;

#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub tipo: Option<OrderKind>,
    pub estado: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct TicketFilter {
    pub tipo: Option<OrderKind>,
    pub desde: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub kind: OrderKind,
    /// Table number. Takeaway and delivery get the next free number.
    pub number: Option<i64>,
    pub customer: Option<Customer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLine {
    /// Menu product; its name and price are copied onto the line.
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub unit_price_cents: Option<i64>,
    pub quantity: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayOrder {
    pub method: PaymentMethod,
    /// Cash handed over. Defaults to the exact total.
    pub tendered_cents: Option<i64>,
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidOrder {
    #[serde(flatten)]
    pub settlement: Settlement,
    pub cash: Option<CashSettlement>,
    pub stock: Option<StockPlan>,
}

async fn load(state: &AppState, rid: &str, id: &str) -> Result<Order, ApiError> {
    state
        .db
        .orders()
        .get(rid, id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id.to_string()).into())
}

pub async fn list(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state.db.orders().list(&rid, filter.tipo, filter.estado).await?;
    Ok(Json(orders))
}

pub async fn create(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<CreateOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let repo = state.db.orders();

    let number = match (body.kind, body.number) {
        (OrderKind::Mesa, Some(n)) if n > 0 => n,
        (OrderKind::Mesa, Some(_)) => {
            return Err(ValidationError::MustBePositive { field: "number".to_string() }.into())
        }
        _ => repo.next_number(&rid, body.kind).await?,
    };

    if body.kind == OrderKind::Delivery {
        let customer = body
            .customer
            .as_ref()
            .ok_or_else(|| ValidationError::required("customer"))?;
        validate_name("customer.name", &customer.name)?;
    }

    let order = Order::new(
        Uuid::new_v4().to_string(),
        rid,
        body.kind,
        Some(number),
        body.customer,
        Utc::now(),
    );

    repo.insert(&order).await.map_err(|e| match e {
        mesa_db::DbError::UniqueViolation { .. } => ApiError::Conflict(format!("Table {number} already exists")),
        other => other.into(),
    })?;

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(load(&state, &rid, &id).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.orders().delete(&rid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/ordenes/{id}/productos`
pub async fn add_line(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
    Json(body): Json<AddLine>,
) -> Result<Json<Order>, ApiError> {
    let line = match body.product_id {
        Some(product_id) => {
            let product = state
                .db
                .menu()
                .get_product(&rid, &product_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Product not found: {product_id}")))?;
            if !product.enabled {
                return Err(ApiError::BusinessRule(format!("{} is disabled", product.name)));
            }
            OrderLine {
                product_id: Some(product.id),
                name: product.name,
                unit_price_cents: product.price_cents,
                quantity: body.quantity,
                notes: body.notes,
            }
        }
        None => OrderLine {
            product_id: None,
            name: body.name.ok_or_else(|| ValidationError::required("name"))?,
            unit_price_cents: body
                .unit_price_cents
                .ok_or_else(|| ValidationError::required("unitPriceCents"))?,
            quantity: body.quantity,
            notes: body.notes,
        },
    };

    Ok(Json(state.db.orders().add_line(&rid, &id, line).await?))
}

/// `DELETE /api/ordenes/{id}/productos/{index}`
pub async fn remove_line(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.db.orders().remove_line(&rid, &id, index).await?))
}

/// `POST /api/ordenes/{id}/pagar`
pub async fn pay(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
    Json(body): Json<PayOrder>,
) -> Result<Json<PaidOrder>, ApiError> {
    let cash = match body.method {
        PaymentMethod::Efectivo => {
            let order = load(&state, &rid, &id).await?;
            let tendered = body.tendered_cents.map(Money::from_cents).unwrap_or(order.total());
            Some(settle_cash(order.total(), tendered)?)
        }
        PaymentMethod::Virtual => None,
    };

    let settlement = state
        .db
        .orders()
        .settle(&rid, &id, body.method, body.reference)
        .await?;
    let stock = decrement_after_sale(&state, &rid, &settlement.ticket.lines).await;

    Ok(Json(PaidOrder {
        settlement,
        cash,
        stock,
    }))
}

/// `POST /api/ordenes/{id}/liberar`
pub async fn liberate(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.db.orders().clear(&rid, &id).await?))
}

/// `GET /api/tickets`
pub async fn tickets(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Query(filter): Query<TicketFilter>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let tickets = state.db.orders().tickets(&rid, filter.tipo, filter.desde).await?;
    Ok(Json(tickets))
}
