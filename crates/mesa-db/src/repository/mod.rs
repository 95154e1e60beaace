//! # Repository Module
//!
//! Database repository implementations for Mesa POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  db.orders().settle(restaurant_id, order_id, method, None)     │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── insert / get / list / save / delete                               │
//! │  ├── settle   ──► order + ticket + income (+ movement), one tx        │
//! │  └── clear    ──► mesa back to libre                                   │
//! │       │                                                                 │
//! │       │  SQL, always filtered by restaurant_id                          │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cross-repository writes share `pub(crate)` helpers that take a
//! `&mut SqliteConnection`, so one transaction can span several tables.
//!
//! ## Available Repositories
//!
//! - [`RestaurantRepository`] - Tenants and their processor credential
//! - [`EmployeeRepository`] - Back-office logins
//! - [`MenuRepository`] - Categories and products
//! - [`InventoryRepository`] - Drinks, raw materials, stock decrement
//! - [`OrderRepository`] - Orders, settlement, tickets
//! - [`LedgerRepository`] - Incomes, expenses, virtual money, gateway log
//! - [`RegisterRepository`] - Cash register sessions
//! - [`ShiftRepository`] - Employee shifts

pub mod employee;
pub mod inventory;
pub mod ledger;
pub mod menu;
pub mod order;
pub mod register;
pub mod restaurant;
pub mod shift;

pub use employee::EmployeeRepository;
pub use inventory::InventoryRepository;
pub use ledger::{GatewayRecord, LedgerRepository};
pub use menu::MenuRepository;
pub use order::{OrderRepository, Settlement};
pub use register::{RegisterClose, RegisterRepository};
pub use restaurant::RestaurantRepository;
pub use shift::ShiftRepository;
