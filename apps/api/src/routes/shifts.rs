//! Employee shift history.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::Tenant;
use crate::AppState;
use mesa_core::{Shift, ValidationError};

#[derive(Debug, Deserialize)]
pub struct ShiftFilter {
    #[serde(rename = "usuarioId")]
    pub usuario_id: Option<String>,
    pub abiertos: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ShiftBody {
    #[serde(rename = "usuarioId")]
    pub usuario_id: String,
}

impl ShiftBody {
    fn user_id(&self) -> Result<&str, ValidationError> {
        let id = self.usuario_id.trim();
        if id.is_empty() {
            return Err(ValidationError::required("usuarioId"));
        }
        Ok(id)
    }
}

pub async fn list(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Query(filter): Query<ShiftFilter>,
) -> Result<Json<Vec<Shift>>, ApiError> {
    let shifts = state
        .db
        .shifts()
        .list(&rid, filter.usuario_id.as_deref(), filter.abiertos.unwrap_or(false))
        .await?;
    Ok(Json(shifts))
}

/// Returns the already-open shift when there is one. The employee must
/// belong to the tenant.
pub async fn open(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<ShiftBody>,
) -> Result<Json<Shift>, ApiError> {
    let user_id = body.user_id()?;
    if state.db.employees().get(&rid, user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Employee not found: {user_id}")));
    }
    Ok(Json(state.db.shifts().open(&rid, user_id).await?))
}

pub async fn close(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<ShiftBody>,
) -> Result<Json<Shift>, ApiError> {
    Ok(Json(state.db.shifts().close(&rid, body.user_id()?).await?))
}
