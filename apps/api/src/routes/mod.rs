//! Route table and shared extractors.
//!
//! Handlers are thin: parse, validate, call one repository (or a few), map
//! the error. Business rules live in `mesa-core`, SQL in `mesa-db`.

pub mod inventory;
pub mod ledger;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod register;
pub mod restaurants;
pub mod session;
pub mod shifts;

use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::ApiError;
use crate::AppState;
use mesa_core::inventory::StockPlan;
use mesa_core::validation::validate_restaurant_id;
use mesa_core::{OrderLine, ValidationError};

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Tenants & sessions
        .route("/api/restaurantes", post(restaurants::create))
        .route("/api/restaurantes/{id}", get(restaurants::get))
        .route("/api/restaurantes/{id}/pagos", put(restaurants::set_gateway))
        .route("/api/auth/login", post(session::login))
        .route("/api/auth/logout", post(session::logout))
        .route("/api/auth/session", get(session::current))
        .route("/api/empleados", post(session::create_employee))
        // Menu
        .route("/api/categorias", get(menu::list_categories).post(menu::create_category))
        .route(
            "/api/categorias/{id}",
            put(menu::update_category).delete(menu::delete_category),
        )
        .route("/api/productos", get(menu::list_products).post(menu::create_product))
        .route(
            "/api/productos/{id}",
            put(menu::update_product).delete(menu::delete_product),
        )
        .route("/api/productos/{id}/habilitada", patch(menu::toggle_product))
        // Stock
        .route("/api/bebidas", get(inventory::list_drinks).post(inventory::create_drink))
        .route(
            "/api/bebidas/{id}",
            put(inventory::update_drink).delete(inventory::delete_drink),
        )
        .route(
            "/api/materias-primas",
            get(inventory::list_raw_materials).post(inventory::create_raw_material),
        )
        .route(
            "/api/materias-primas/{id}",
            put(inventory::update_raw_material).delete(inventory::delete_raw_material),
        )
        .route("/api/stock/descontar", post(inventory::decrement))
        // Orders
        .route("/api/ordenes", get(orders::list).post(orders::create))
        .route("/api/ordenes/{id}", get(orders::get).delete(orders::remove))
        .route("/api/ordenes/{id}/productos", post(orders::add_line))
        .route("/api/ordenes/{id}/productos/{index}", delete(orders::remove_line))
        .route("/api/ordenes/{id}/pagar", post(orders::pay))
        .route("/api/ordenes/{id}/liberar", post(orders::liberate))
        .route("/api/tickets", get(orders::tickets))
        // Payments
        .route("/api/pagos/qr", post(payments::create_qr))
        .route("/api/pagos/webhook", post(payments::webhook))
        .route("/api/pagos-resumen", get(payments::summary))
        // Ledger
        .route("/api/ingresos", get(ledger::list_incomes).post(ledger::create_income))
        .route("/api/egresos", get(ledger::list_expenses).post(ledger::create_expense))
        .route("/api/dinero", get(ledger::money))
        // Cash register
        .route("/api/caja", get(register::overview))
        .route("/api/caja/abrir", post(register::open))
        .route("/api/caja/cerrar", post(register::close))
        .route("/api/caja/extraer", post(register::withdraw))
        // Shifts
        .route("/api/historial-empleados", get(shifts::list))
        .route("/api/historial-empleados/abrir", post(shifts::open))
        .route("/api/historial-empleados/cerrar", post(shifts::close))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness plus a database round trip.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "unreachable" })),
        )
    }
}

// =============================================================================
// Tenant Extractor
// =============================================================================

/// The restaurant a request acts on, from `?restauranteId=<slug>`.
#[derive(Debug, Clone)]
pub struct Tenant(pub String);

#[derive(Debug, Deserialize)]
struct TenantQuery {
    #[serde(rename = "restauranteId")]
    restaurante_id: Option<String>,
}

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<TenantQuery>::try_from_uri(&parts.uri)
            .map_err(|e| ApiError::Validation(e.body_text()))?;

        let id = query
            .restaurante_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ValidationError::required("restauranteId"))?;

        validate_restaurant_id(&id)?;
        Ok(Tenant(id))
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Decrements stock for sold lines after a payment was committed.
///
/// The payment stands even if this fails, so the error is logged instead of
/// returned.
pub(crate) async fn decrement_after_sale(
    state: &AppState,
    restaurant_id: &str,
    lines: &[OrderLine],
) -> Option<StockPlan> {
    match state.db.inventory().apply_sale(restaurant_id, lines).await {
        Ok(plan) => Some(plan),
        Err(e) => {
            error!(restaurant_id, error = %e, "Stock decrement after payment failed");
            None
        }
    }
}
