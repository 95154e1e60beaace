//! Drinks, raw materials and the manual stock decrement.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::Tenant;
use crate::AppState;
use mesa_core::inventory::StockPlan;
use mesa_core::validation::{validate_name, validate_price_cents, validate_quantity, validate_stock};
use mesa_core::{Drink, OrderLine, RawMaterial};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrinkBody {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RawMaterialBody {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub stock: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SoldLines {
    pub lines: Vec<OrderLine>,
}

// =============================================================================
// Drinks
// =============================================================================

pub async fn list_drinks(State(state): State<AppState>, Tenant(rid): Tenant) -> Result<Json<Vec<Drink>>, ApiError> {
    Ok(Json(state.db.inventory().drinks(&rid).await?))
}

pub async fn create_drink(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<DrinkBody>,
) -> Result<(StatusCode, Json<Drink>), ApiError> {
    let name = body.name.unwrap_or_default();
    validate_name("name", &name)?;
    let price_cents = body.price_cents.unwrap_or(0);
    validate_price_cents(price_cents)?;
    let stock = body.stock.unwrap_or(0);
    validate_stock(stock)?;

    let now = Utc::now();
    let drink = Drink {
        id: Uuid::new_v4().to_string(),
        restaurant_id: rid,
        name: name.trim().to_string(),
        price_cents,
        stock,
        enabled: body.enabled.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    state.db.inventory().insert_drink(&drink).await?;
    Ok((StatusCode::CREATED, Json(drink)))
}

pub async fn update_drink(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
    Json(body): Json<DrinkBody>,
) -> Result<Json<Drink>, ApiError> {
    let inventory = state.db.inventory();
    let mut drink = inventory
        .get_drink(&rid, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Drink not found: {id}")))?;

    if let Some(name) = body.name {
        validate_name("name", &name)?;
        drink.name = name.trim().to_string();
    }
    if let Some(price_cents) = body.price_cents {
        validate_price_cents(price_cents)?;
        drink.price_cents = price_cents;
    }
    if let Some(stock) = body.stock {
        validate_stock(stock)?;
        drink.stock = stock;
    }
    if let Some(enabled) = body.enabled {
        drink.enabled = enabled;
    }
    drink.updated_at = Utc::now();

    inventory.update_drink(&drink).await?;
    Ok(Json(drink))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.inventory().delete_drink(&rid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Raw Materials
// =============================================================================

pub async fn list_raw_materials(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
) -> Result<Json<Vec<RawMaterial>>, ApiError> {
    Ok(Json(state.db.inventory().raw_materials(&rid).await?))
}

pub async fn create_raw_material(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<RawMaterialBody>,
) -> Result<(StatusCode, Json<RawMaterial>), ApiError> {
    let name = body.name.unwrap_or_default();
    validate_name("name", &name)?;
    let stock = body.stock.unwrap_or(0);
    validate_stock(stock)?;

    let now = Utc::now();
    let material = RawMaterial {
        id: Uuid::new_v4().to_string(),
        restaurant_id: rid,
        name: name.trim().to_string(),
        unit: body
            .unit
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "unidad".to_string()),
        stock,
        created_at: now,
        updated_at: now,
    };

    state.db.inventory().insert_raw_material(&material).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn update_raw_material(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
    Json(body): Json<RawMaterialBody>,
) -> Result<Json<RawMaterial>, ApiError> {
    let inventory = state.db.inventory();
    let mut material = inventory
        .get_raw_material(&rid, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Raw material not found: {id}")))?;

    if let Some(name) = body.name {
        validate_name("name", &name)?;
        material.name = name.trim().to_string();
    }
    if let Some(unit) = body.unit.filter(|u| !u.trim().is_empty()) {
        material.unit = unit.trim().to_string();
    }
    if let Some(stock) = body.stock {
        validate_stock(stock)?;
        material.stock = stock;
    }
    material.updated_at = Utc::now();

    inventory.update_raw_material(&material).await?;
    Ok(Json(material))
}

pub async fn delete_raw_material(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.inventory().delete_raw_material(&rid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Stock Decrement
// =============================================================================

/// `POST /api/stock/descontar`: not idempotent, each call decrements.
pub async fn decrement(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<SoldLines>,
) -> Result<Json<StockPlan>, ApiError> {
    for line in &body.lines {
        validate_quantity(line.quantity)?;
    }

    Ok(Json(state.db.inventory().apply_sale(&rid, &body.lines).await?))
}
