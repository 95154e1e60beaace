//! # mesa-core: Pure Business Logic for Mesa POS
//!
//! This crate holds the restaurant domain: orders for tables, takeaway and
//! delivery, the income/expense ledger, the cash register, stock planning and
//! the payments summary. Everything here is a pure function over values.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mesa POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Back-office UI (React)                          │   │
//! │  │   Table grid ──► Order ──► Cash / QR modal ──► Dashboard        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP JSON (/api/*)                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mesa-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  summary  │  │ inventory │  │  payment  │  │   │
//! │  │   │   Order   │  │  dinero   │  │   stock   │  │  webhook  │  │   │
//! │  │   │  Income   │  │  ventas   │  │  matching │  │  decision │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mesa-db (Database Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, Income, CashRegister, Shift, etc.)
//! - [`money`] - Money type with integer centavos
//! - [`error`] - Domain error types
//! - [`validation`] - Input rules and tenant slugs
//! - [`summary`] - Payments summary (pagos-resumen) aggregation
//! - [`inventory`] - Stock decrement planning with fuzzy name matching
//! - [`payment`] - Cash settlement and processor webhook decisions
//! - [`register`] - Cash register reconciliation
//!
//! ## Example Usage
//!
//! ```rust
//! use mesa_core::money::Money;
//!
//! let empanada = Money::from_cents(150_000);
//! let line = empanada.multiply_quantity(3);
//! assert_eq!(line.to_string(), "$ 4.500,00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod money;
pub mod payment;
pub mod register;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of most recent incomes/expenses returned by the payments summary.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Maximum lines allowed in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Highest unit price accepted, in centavos (1.000 millones de pesos).
///
/// With [`MAX_LINE_QUANTITY`] and [`MAX_ORDER_LINES`] an order total stays
/// far below `i64::MAX`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Maximum quantity of a single line.
///
/// Guards against typing 1000 instead of 10 on the order screen.
pub const MAX_LINE_QUANTITY: i64 = 999;
