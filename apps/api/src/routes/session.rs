//! Login, logout and employee accounts.
//!
//! A login opens the employee's shift (idempotent); a logout closes it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, AdminSession, Claims, Session};
use crate::error::ApiError;
use crate::routes::Tenant;
use crate::AppState;
use mesa_core::validation::{validate_email, validate_name, validate_password};
use mesa_core::{Employee, Role, Shift};
use mesa_db::DbError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub employee: Employee,
    pub shift: Shift,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// The shift that was closed, if one was open.
    pub shift: Option<Shift>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEmployee {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// `POST /api/auth/login?restauranteId=..`
pub async fn login(
    State(state): State<AppState>,
    Tenant(restaurant_id): Tenant,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let employee = state
        .db
        .employees()
        .find_by_email(&restaurant_id, &body.email)
        .await?;

    let employee = match employee {
        Some(e) if verify_password(&body.password, &e.password_hash) => e,
        _ => {
            warn!(restaurant_id = %restaurant_id, "Failed login attempt");
            return Err(ApiError::Unauthenticated("Invalid email or password".to_string()));
        }
    };

    let token = state.jwt.issue(&employee)?;
    let shift = state.db.shifts().open(&restaurant_id, &employee.id).await?;

    info!(restaurant_id = %restaurant_id, employee_id = %employee.id, "Employee logged in");
    Ok(Json(LoginResponse {
        token,
        expires_in: state.jwt.lifetime_secs(),
        employee,
        shift,
    }))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    Session(claims): Session,
) -> Result<Json<LogoutResponse>, ApiError> {
    let shift = match state.db.shifts().close(&claims.restaurant_id, &claims.sub).await {
        Ok(shift) => Some(shift),
        Err(DbError::NotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };

    info!(restaurant_id = %claims.restaurant_id, employee_id = %claims.sub, "Employee logged out");
    Ok(Json(LogoutResponse { shift }))
}

/// `GET /api/auth/session`
pub async fn current(Session(claims): Session) -> Json<Claims> {
    Json(claims)
}

/// `POST /api/empleados`: admin creates an employee of their own restaurant.
pub async fn create_employee(
    State(state): State<AppState>,
    AdminSession(claims): AdminSession,
    Json(body): Json<CreateEmployee>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    validate_name("name", &body.name)?;
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let employee = Employee {
        id: Uuid::new_v4().to_string(),
        restaurant_id: claims.restaurant_id.clone(),
        name: body.name.trim().to_string(),
        email: body.email.trim().to_lowercase(),
        password_hash: hash_password(&body.password)?,
        role: body.role,
        created_at: Utc::now(),
    };

    state.db.employees().insert(&employee).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}
