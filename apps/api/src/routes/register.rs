//! Cash register: open, close with reconciliation, cash withdrawals.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::Tenant;
use crate::AppState;
use mesa_core::validation::{validate_amount_cents, validate_reason};
use mesa_core::{CashRegister, Expense, ValidationError};
use mesa_db::RegisterClose;

const HISTORY_LIMIT: i64 = 20;

#[derive(Debug, Serialize)]
pub struct Overview {
    pub current: Option<CashRegister>,
    pub history: Vec<CashRegister>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenBody {
    pub opening_cents: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseBody {
    pub counted_cents: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawBody {
    pub amount_cents: i64,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct Withdrawal {
    pub register: CashRegister,
    pub expense: Expense,
}

fn non_negative(field: &str, cents: i64) -> Result<(), ValidationError> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// `GET /api/caja`
pub async fn overview(State(state): State<AppState>, Tenant(rid): Tenant) -> Result<Json<Overview>, ApiError> {
    let registers = state.db.registers();
    let (current, history) = tokio::try_join!(registers.current(&rid), registers.history(&rid, HISTORY_LIMIT))?;
    Ok(Json(Overview { current, history }))
}

/// `POST /api/caja/abrir`: 409 while another register is open.
pub async fn open(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<OpenBody>,
) -> Result<(StatusCode, Json<CashRegister>), ApiError> {
    non_negative("openingCents", body.opening_cents)?;
    let register = state.db.registers().open(&rid, body.opening_cents).await?;
    Ok((StatusCode::CREATED, Json(register)))
}

/// `POST /api/caja/cerrar`
pub async fn close(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<CloseBody>,
) -> Result<Json<RegisterClose>, ApiError> {
    non_negative("countedCents", body.counted_cents)?;
    Ok(Json(state.db.registers().close(&rid, body.counted_cents).await?))
}

/// `POST /api/caja/extraer`
pub async fn withdraw(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<WithdrawBody>,
) -> Result<Json<Withdrawal>, ApiError> {
    validate_amount_cents("amountCents", body.amount_cents)?;
    validate_reason(&body.reason)?;

    let (register, expense) = state
        .db
        .registers()
        .withdraw(&rid, body.amount_cents, body.reason.trim())
        .await?;
    Ok(Json(Withdrawal { register, expense }))
}
