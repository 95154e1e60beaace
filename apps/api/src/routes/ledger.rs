//! Manual incomes, expenses and the virtual money balance.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::Tenant;
use crate::AppState;
use mesa_core::validation::{validate_amount_cents, validate_reason};
use mesa_core::{Expense, Income, PaymentMethod, VirtualMovement};

#[derive(Debug, Deserialize)]
pub struct SinceQuery {
    pub desde: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeBody {
    pub amount_cents: i64,
    pub reason: String,
    pub method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseBody {
    pub amount_cents: i64,
    pub reason: String,
    /// Account the money leaves from.
    pub account: PaymentMethod,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMoney {
    pub balance_cents: i64,
    pub movements: Vec<VirtualMovement>,
}

pub async fn list_incomes(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Query(query): Query<SinceQuery>,
) -> Result<Json<Vec<Income>>, ApiError> {
    Ok(Json(state.db.ledger().list_incomes(&rid, query.desde).await?))
}

pub async fn create_income(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<IncomeBody>,
) -> Result<(StatusCode, Json<Income>), ApiError> {
    validate_amount_cents("amountCents", body.amount_cents)?;
    validate_reason(&body.reason)?;

    let income = state
        .db
        .ledger()
        .record_income(&rid, body.amount_cents, body.reason.trim(), body.method)
        .await?;
    Ok((StatusCode::CREATED, Json(income)))
}

pub async fn list_expenses(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Query(query): Query<SinceQuery>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    Ok(Json(state.db.ledger().list_expenses(&rid, query.desde).await?))
}

pub async fn create_expense(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<ExpenseBody>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    validate_amount_cents("amountCents", body.amount_cents)?;
    validate_reason(&body.reason)?;

    let expense = state
        .db
        .ledger()
        .record_expense(&rid, body.amount_cents, body.reason.trim(), body.account)
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// `GET /api/dinero`: running virtual balance and its movements.
pub async fn money(State(state): State<AppState>, Tenant(rid): Tenant) -> Result<Json<VirtualMoney>, ApiError> {
    let ledger = state.db.ledger();
    let (balance_cents, movements) =
        tokio::try_join!(ledger.virtual_balance(&rid), ledger.virtual_movements(&rid, None))?;

    Ok(Json(VirtualMoney {
        balance_cents,
        movements,
    }))
}
