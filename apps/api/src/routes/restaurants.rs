//! Tenant creation and processor credential.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, AdminSession};
use crate::error::ApiError;
use crate::AppState;
use mesa_core::validation::{slugify, validate_email, validate_name, validate_password, validate_restaurant_id};
use mesa_core::{Employee, Restaurant, Role};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestaurant {
    pub name: String,
    pub admin_name: String,
    pub admin_email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRestaurant {
    pub restaurant: Restaurant,
    pub admin: Employee,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayCredential {
    /// `None` or blank removes the stored token.
    pub access_token: Option<String>,
}

/// `POST /api/restaurantes`: the id is the slug of the name.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateRestaurant>,
) -> Result<(StatusCode, Json<CreatedRestaurant>), ApiError> {
    validate_name("name", &body.name)?;
    validate_name("adminName", &body.admin_name)?;
    validate_email(&body.admin_email)?;
    validate_password(&body.password)?;

    let id = slugify(&body.name);
    validate_restaurant_id(&id)?;

    let now = Utc::now();
    let restaurant = Restaurant {
        id: id.clone(),
        name: body.name.trim().to_string(),
        gateway_access_token: None,
        created_at: now,
    };
    let admin = Employee {
        id: Uuid::new_v4().to_string(),
        restaurant_id: id,
        name: body.admin_name.trim().to_string(),
        email: body.admin_email.trim().to_lowercase(),
        password_hash: hash_password(&body.password)?,
        role: Role::Admin,
        created_at: now,
    };

    state
        .db
        .restaurants()
        .create_with_admin(&restaurant, &admin)
        .await
        .map_err(|e| match e {
            mesa_db::DbError::UniqueViolation { .. } => {
                ApiError::Conflict(format!("Restaurant '{}' already exists", restaurant.id))
            }
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(CreatedRestaurant { restaurant, admin })))
}

/// `GET /api/restaurantes/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Restaurant>, ApiError> {
    let restaurant = state
        .db
        .restaurants()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Restaurant not found: {id}")))?;

    Ok(Json(restaurant))
}

/// `PUT /api/restaurantes/{id}/pagos`: admins of that restaurant only.
pub async fn set_gateway(
    State(state): State<AppState>,
    AdminSession(claims): AdminSession,
    Path(id): Path<String>,
    Json(body): Json<GatewayCredential>,
) -> Result<StatusCode, ApiError> {
    if claims.restaurant_id != id {
        return Err(ApiError::Forbidden("Session belongs to another restaurant".to_string()));
    }

    let token = body
        .access_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    state.db.restaurants().set_gateway_token(&id, token).await?;
    info!(restaurant_id = %id, by = %claims.sub, "Processor credential changed");
    Ok(StatusCode::NO_CONTENT)
}
