//! # mesa-db: Database Layer for Mesa POS
//!
//! This crate provides database access for Mesa POS.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mesa POS Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /api/ordenes/{id}/pagar)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     mesa-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ OrderRepo     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ LedgerRepo    │    │ 001_initial  │  │   │
//! │  │   │               │    │ RegisterRepo  │    │              │  │   │
//! │  │   └───────────────┘    │ ShiftRepo ... │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (mesa.db, WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Multi-row changes (settling an order, withdrawing cash, applying a sale to
//! stock, logging a processor payment) run inside one transaction each.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesa_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("mesa.db")).await?;
//! let tables = db.orders().list("la-parrilla", Some(OrderKind::Mesa), None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    EmployeeRepository, GatewayRecord, InventoryRepository, LedgerRepository, MenuRepository,
    OrderRepository, RegisterClose, RegisterRepository, RestaurantRepository, Settlement,
    ShiftRepository,
};

/// New random row id.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
