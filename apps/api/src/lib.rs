//! # Mesa API
//!
//! HTTP JSON API for the restaurant back office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Mesa API Routes                               │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Salon         │  │  Money         │  │  Back office               ││
//! │  │                │  │                │  │                            ││
//! │  │ • ordenes      │  │ • pagos/qr     │  │ • categorias / productos   ││
//! │  │ • tickets      │  │ • pagos/webhook│  │ • bebidas / materias-primas││
//! │  │ • stock        │  │ • pagos-resumen│  │ • empleados / historial    ││
//! │  │                │  │ • caja, dinero │  │ • auth (JWT session)       ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │  SQLite (mesa-db)   •   PaymentGateway (reqwest)   •   JWT        │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every tenant route takes the restaurant as `?restauranteId=<slug>`.
//!
//! ## Configuration
//! See [`config`]: defaults, then `mesa.toml` (or `MESA_CONFIG`), then
//! `MESA__*` environment variables.

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod routes;

use std::sync::Arc;

// Re-exports
pub use config::AppConfig;
pub use error::ApiError;
pub use routes::router;

use crate::auth::JwtManager;
use crate::gateway::PaymentGateway;
use mesa_db::Database;

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtManager>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        let jwt = JwtManager::new(config.auth.jwt_secret.clone(), config.auth.token_lifetime_secs);

        AppState {
            db,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            gateway,
        }
    }
}
