//! Categories and products.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::Tenant;
use crate::AppState;
use mesa_core::validation::{validate_name, validate_price_cents, validate_stock};
use mesa_core::{Category, Product};

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub position: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDeleted {
    pub removed_products: u64,
}

pub async fn list_categories(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.db.menu().categories(&rid).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<CategoryBody>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let name = body.name.unwrap_or_default();
    validate_name("name", &name)?;

    let category = Category {
        id: Uuid::new_v4().to_string(),
        restaurant_id: rid,
        name: name.trim().to_string(),
        enabled: body.enabled.unwrap_or(true),
        position: body.position.unwrap_or(0),
        created_at: Utc::now(),
    };

    state.db.menu().insert_category(&category).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
    Json(body): Json<CategoryBody>,
) -> Result<Json<Category>, ApiError> {
    let menu = state.db.menu();
    let mut category = menu
        .get_category(&rid, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Category not found: {id}")))?;

    if let Some(name) = body.name {
        validate_name("name", &name)?;
        category.name = name.trim().to_string();
    }
    if let Some(enabled) = body.enabled {
        category.enabled = enabled;
    }
    if let Some(position) = body.position {
        category.position = position;
    }

    menu.update_category(&category).await?;
    Ok(Json(category))
}

/// Removes the category together with its products.
pub async fn delete_category(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
) -> Result<Json<CategoryDeleted>, ApiError> {
    let removed_products = state.db.menu().delete_category(&rid, &id).await?;
    Ok(Json(CategoryDeleted { removed_products }))
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    #[serde(rename = "categoriaId")]
    pub categoria_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBody {
    pub category_id: Option<String>,
    pub subcategory: Option<String>,
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct Toggle {
    pub enabled: bool,
}

pub async fn list_products(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .db
        .menu()
        .products(&rid, filter.categoria_id.as_deref())
        .await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Json(body): Json<ProductBody>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let category_id = body
        .category_id
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("categoryId is required".to_string()))?;
    let name = body.name.unwrap_or_default();
    validate_name("name", &name)?;
    let price_cents = body
        .price_cents
        .ok_or_else(|| ApiError::Validation("priceCents is required".to_string()))?;
    validate_price_cents(price_cents)?;
    if let Some(stock) = body.stock {
        validate_stock(stock)?;
    }

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        restaurant_id: rid,
        category_id,
        subcategory: body.subcategory,
        name: name.trim().to_string(),
        price_cents,
        stock: body.stock,
        enabled: body.enabled.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    state.db.menu().insert_product(&product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
    Json(body): Json<ProductBody>,
) -> Result<Json<Product>, ApiError> {
    let menu = state.db.menu();
    let mut product = menu
        .get_product(&rid, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))?;

    if let Some(category_id) = body.category_id {
        product.category_id = category_id;
    }
    if body.subcategory.is_some() {
        product.subcategory = body.subcategory;
    }
    if let Some(name) = body.name {
        validate_name("name", &name)?;
        product.name = name.trim().to_string();
    }
    if let Some(price_cents) = body.price_cents {
        validate_price_cents(price_cents)?;
        product.price_cents = price_cents;
    }
    if let Some(stock) = body.stock {
        validate_stock(stock)?;
        product.stock = Some(stock);
    }
    if let Some(enabled) = body.enabled {
        product.enabled = enabled;
    }
    product.updated_at = Utc::now();

    menu.update_product(&product).await?;
    Ok(Json(product))
}

/// `PATCH /api/productos/{id}/habilitada`
pub async fn toggle_product(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
    Json(body): Json<Toggle>,
) -> Result<Json<Product>, ApiError> {
    let product = state.db.menu().set_product_enabled(&rid, &id, body.enabled).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Tenant(rid): Tenant,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.menu().delete_product(&rid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
