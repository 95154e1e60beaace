//! # Domain Types
//!
//! Core domain types used throughout Mesa POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Restaurant (tenant root, slug id)                                      │
//! │     │                                                                   │
//! │     ├── Category ──► Product        Drink         RawMaterial           │
//! │     │                (menu)         (stock)       (stock)               │
//! │     │                                                                   │
//! │     ├── Order { kind: mesa | takeaway | delivery }                      │
//! │     │     status: libre ──► abierta ──► pagado ──► (clear) libre        │
//! │     │     └── Ticket (immutable snapshot at payment)                    │
//! │     │                                                                   │
//! │     ├── Income / Expense (append-only ledger)                           │
//! │     ├── CashRegister (opening float, close, withdrawals)                │
//! │     ├── VirtualMovement ("Dinero": processor balance)                   │
//! │     ├── PaymentTransaction (processor notification log)                 │
//! │     └── Employee ──► Shift (turno: open/close)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity carries `restaurant_id`: tenants never share rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_line_name, validate_price_cents, validate_quantity};
use crate::MAX_ORDER_LINES;

// =============================================================================
// Enumerations
// =============================================================================

/// Kind of order. Tables are long-lived and get cleared after payment;
/// takeaway and delivery orders are created per customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OrderKind {
    /// Dine-in table.
    Mesa,
    Takeaway,
    Delivery,
}

impl OrderKind {
    pub const ALL: [OrderKind; 3] = [OrderKind::Mesa, OrderKind::Takeaway, OrderKind::Delivery];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Mesa => "mesa",
            OrderKind::Takeaway => "takeaway",
            OrderKind::Delivery => "delivery",
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OrderStatus {
    /// Table without products.
    Libre,
    /// Products are being added.
    Abierta,
    /// Settled. Terminal until the order is cleared.
    Pagado,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Libre => "libre",
            OrderStatus::Abierta => "abierta",
            OrderStatus::Pagado => "pagado",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How money moved: cash in the drawer or through the processor
/// (card, QR, transfer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMethod {
    Efectivo,
    Virtual,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "efectivo",
            PaymentMethod::Virtual => "virtual",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employee role, carried in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Cajero,
    Mozo,
    Cocina,
}

/// Where an income came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum IncomeSource {
    /// Recorded when an order is settled.
    Venta,
    /// Entered by hand (deposit modal, adjustments).
    Manual,
}

// =============================================================================
// Tenant & Staff
// =============================================================================

/// Tenant root. The id is the slug of the restaurant name.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    /// Processor credential used to query payments. Never sent to clients.
    #[serde(skip)]
    #[ts(skip)]
    pub gateway_access_token: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Restaurant {
    pub fn has_gateway(&self) -> bool {
        self.gateway_access_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

/// A user of the back office.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string.
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Menu & Stock
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub enabled: bool,
    /// Display order on the menu screen.
    pub position: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A menu item, nested under a category and an optional subcategory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub restaurant_id: String,
    pub category_id: String,
    pub subcategory: Option<String>,
    pub name: String,
    pub price_cents: i64,
    /// `None` when the product does not track stock.
    pub stock: Option<i64>,
    pub enabled: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Bebida: a sellable item whose stock is decremented on every sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Drink {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub enabled: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Materia prima: kitchen supply tracked in its own unit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RawMaterial {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    /// Free text: "kg", "unidad", "litro".
    pub unit: String,
    pub stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Orders
// =============================================================================

/// One product on an order. Name and price are frozen when the line is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderLine {
    #[serde(default)]
    pub product_id: Option<String>,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OrderLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    /// Line total, `None` when it does not fit in centavos.
    pub fn checked_total(&self) -> Option<Money> {
        Money::from_cents(self.unit_price_cents).checked_multiply_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Required in practice for delivery, unused for tables.
    #[serde(default)]
    pub address: Option<String>,
}

/// A table, takeaway or delivery order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub restaurant_id: String,
    pub kind: OrderKind,
    /// Table number for `mesa`, sequence number otherwise.
    pub number: Option<i64>,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub total_cents: i64,
    pub customer: Option<Customer>,
    pub payment_method: Option<PaymentMethod>,
    /// Processor payment id for virtual payments.
    pub payment_reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates an empty order. Tables start `libre`, the rest `abierta`.
    pub fn new(
        id: impl Into<String>,
        restaurant_id: impl Into<String>,
        kind: OrderKind,
        number: Option<i64>,
        customer: Option<Customer>,
        now: DateTime<Utc>,
    ) -> Self {
        let status = match kind {
            OrderKind::Mesa => OrderStatus::Libre,
            OrderKind::Takeaway | OrderKind::Delivery => OrderStatus::Abierta,
        };

        Order {
            id: id.into(),
            restaurant_id: restaurant_id.into(),
            kind,
            number,
            status,
            lines: Vec::new(),
            total_cents: 0,
            customer,
            payment_method: None,
            payment_reference: None,
            created_at: now,
            updated_at: now,
            paid_at: None,
        }
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Pagado
    }

    fn ensure_not_paid(&self) -> CoreResult<()> {
        if self.is_paid() {
            return Err(CoreError::InvalidOrderStatus {
                order_id: self.id.clone(),
                current_status: self.status.to_string(),
            });
        }
        Ok(())
    }

    /// Appends a line and recomputes the total. A free table becomes `abierta`.
    pub fn add_line(&mut self, line: OrderLine, now: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_not_paid()?;
        validate_line_name(&line.name)?;
        validate_price_cents(line.unit_price_cents)?;
        validate_quantity(line.quantity)?;

        if self.lines.len() >= MAX_ORDER_LINES {
            return Err(CoreError::OrderTooLarge {
                max: MAX_ORDER_LINES,
            });
        }

        let total = self
            .lines
            .iter()
            .chain(std::iter::once(&line))
            .try_fold(Money::zero(), |acc, l| acc.checked_add(l.checked_total()?))
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "totalCents".to_string(),
                min: 0,
                max: i64::MAX,
            })?;

        self.lines.push(line);
        self.status = OrderStatus::Abierta;
        self.total_cents = total.cents();
        self.updated_at = now;
        Ok(())
    }

    /// Removes the line at `index`. A table with no lines left is `libre` again.
    pub fn remove_line(&mut self, index: usize, now: DateTime<Utc>) -> CoreResult<OrderLine> {
        self.ensure_not_paid()?;

        if index >= self.lines.len() {
            return Err(ValidationError::OutOfRange {
                field: "index".to_string(),
                min: 0,
                max: self.lines.len() as i64 - 1,
            }
            .into());
        }

        let removed = self.lines.remove(index);
        if self.lines.is_empty() && self.kind == OrderKind::Mesa {
            self.status = OrderStatus::Libre;
        }
        self.recompute_total();
        self.updated_at = now;
        Ok(removed)
    }

    /// The stored total is always the sum of line totals.
    pub fn recompute_total(&mut self) {
        self.total_cents = self.lines.iter().map(OrderLine::line_total).sum::<Money>().cents();
    }

    /// Settles the order. Rejected for empty or already paid orders.
    pub fn mark_paid(
        &mut self,
        method: PaymentMethod,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.ensure_not_paid()?;
        if self.lines.is_empty() {
            return Err(CoreError::EmptyOrder(self.id.clone()));
        }

        self.status = OrderStatus::Pagado;
        self.payment_method = Some(method);
        self.payment_reference = reference;
        self.paid_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Liberates the order: back to `libre` with no lines and no payment.
    ///
    /// Allowed once paid, or when the order has nothing on it.
    pub fn clear(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if !self.is_paid() && !self.lines.is_empty() {
            return Err(CoreError::InvalidOrderStatus {
                order_id: self.id.clone(),
                current_status: self.status.to_string(),
            });
        }

        self.status = OrderStatus::Libre;
        self.lines.clear();
        self.total_cents = 0;
        self.customer = None;
        self.payment_method = None;
        self.payment_reference = None;
        self.paid_at = None;
        self.updated_at = now;
        Ok(())
    }

    /// Snapshot of a paid order. `None` while the order is unpaid.
    pub fn ticket(&self, id: impl Into<String>) -> Option<Ticket> {
        let method = self.payment_method?;
        let issued_at = self.paid_at?;
        if !self.is_paid() {
            return None;
        }

        Some(Ticket {
            id: id.into(),
            restaurant_id: self.restaurant_id.clone(),
            order_id: self.id.clone(),
            kind: self.kind,
            number: self.number,
            lines: self.lines.clone(),
            total_cents: self.total_cents,
            payment_method: method,
            payment_reference: self.payment_reference.clone(),
            issued_at,
        })
    }

    /// Reason written on the income recorded for this sale, e.g. "Venta mesa 4".
    pub fn sale_reason(&self) -> String {
        match self.number {
            Some(n) => format!("Venta {} {}", self.kind, n),
            None => format!("Venta {}", self.kind),
        }
    }
}

/// Immutable record of a paid order. Tables get cleared after payment,
/// tickets stay.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Ticket {
    pub id: String,
    pub restaurant_id: String,
    pub order_id: String,
    pub kind: OrderKind,
    pub number: Option<i64>,
    pub lines: Vec<OrderLine>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
}

impl Ticket {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Ingreso. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Income {
    pub id: String,
    pub restaurant_id: String,
    pub amount_cents: i64,
    pub reason: String,
    /// Recorded at transaction time. `None` only on legacy entries.
    pub payment_method: Option<PaymentMethod>,
    pub source: IncomeSource,
    pub order_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Income {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Egreso. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub restaurant_id: String,
    pub amount_cents: i64,
    pub reason: String,
    /// Account the money left from.
    pub account: PaymentMethod,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Caja registradora: one row per drawer session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CashRegister {
    pub id: String,
    pub restaurant_id: String,
    /// Float counted into the drawer at opening.
    pub opening_cents: i64,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub closing_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Sum of cash extractions during the session.
    pub withdrawn_cents: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CashRegister {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    #[inline]
    pub fn opening(&self) -> Money {
        Money::from_cents(self.opening_cents)
    }
}

/// Dinero: a signed movement of the processor (virtual) balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VirtualMovement {
    pub id: String,
    pub restaurant_id: String,
    pub amount_cents: i64,
    pub reason: String,
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One processed processor notification.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentTransaction {
    pub id: String,
    pub restaurant_id: String,
    pub gateway_payment_id: String,
    pub status: String,
    pub amount_cents: i64,
    pub external_reference: Option<String>,
    /// Set when the notification settled an order.
    pub order_id: Option<String>,
    #[ts(as = "String")]
    pub received_at: DateTime<Utc>,
}

// =============================================================================
// Shifts
// =============================================================================

/// Turno: an employee session between login and logout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub restaurant_id: String,
    pub user_id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Shift {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Worked minutes; open shifts are measured up to `now`.
    pub fn worked_minutes(&self, now: DateTime<Utc>) -> i64 {
        let end = self.closed_at.unwrap_or(now);
        (end - self.opened_at).num_minutes().max(0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn line(name: &str, price: i64, qty: i64) -> OrderLine {
        OrderLine {
            product_id: None,
            name: name.to_string(),
            unit_price_cents: price,
            quantity: qty,
            notes: None,
        }
    }

    fn table() -> Order {
        Order::new("o-1", "la-parrilla", OrderKind::Mesa, Some(4), None, Utc::now())
    }

    #[test]
    fn test_new_order_status_by_kind() {
        assert_eq!(table().status, OrderStatus::Libre);
        let takeaway = Order::new("o-2", "r", OrderKind::Takeaway, None, None, Utc::now());
        assert_eq!(takeaway.status, OrderStatus::Abierta);
    }

    #[test]
    fn test_add_line_opens_table_and_totals() {
        let mut order = table();
        order.add_line(line("Milanesa", 850_000, 2), Utc::now()).unwrap();
        order.add_line(line("Coca-Cola", 200_000, 1), Utc::now()).unwrap();

        assert_eq!(order.status, OrderStatus::Abierta);
        assert_eq!(order.total_cents, 1_900_000);
    }

    #[test]
    fn test_remove_last_line_frees_table() {
        let mut order = table();
        order.add_line(line("Flan", 300_000, 1), Utc::now()).unwrap();
        let removed = order.remove_line(0, Utc::now()).unwrap();

        assert_eq!(removed.name, "Flan");
        assert_eq!(order.status, OrderStatus::Libre);
        assert_eq!(order.total_cents, 0);
        assert!(order.remove_line(0, Utc::now()).is_err());
    }

    #[test]
    fn test_add_line_rejects_bad_input() {
        let mut order = table();
        assert!(order.add_line(line("", 100, 1), Utc::now()).is_err());
        assert!(order.add_line(line("Agua", -1, 1), Utc::now()).is_err());
        assert!(order.add_line(line("Agua", 100, 0), Utc::now()).is_err());
    }

    #[test]
    fn test_add_line_rejects_overflowing_amounts() {
        let mut order = table();
        let err = order.add_line(line("Vino", i64::MAX / 2, 3), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
        assert!(order.lines.is_empty());
        assert_eq!(order.total_cents, 0);

        // Rows written before the price cap existed.
        order.lines.push(line("Importado", i64::MAX / 2, 1));
        order.lines.push(line("Importado", i64::MAX / 2, 1));
        order.recompute_total();

        let err = order.add_line(line("Agua", 100, 1), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.total_cents, i64::MAX - 1);
    }

    #[test]
    fn test_mark_paid_is_terminal() {
        let mut order = table();
        assert!(matches!(
            order.mark_paid(PaymentMethod::Efectivo, None, Utc::now()),
            Err(CoreError::EmptyOrder(_))
        ));

        order.add_line(line("Pizza", 900_000, 1), Utc::now()).unwrap();
        order
            .mark_paid(PaymentMethod::Virtual, Some("mp-1".into()), Utc::now())
            .unwrap();

        assert!(order.is_paid());
        assert!(order.add_line(line("Postre", 1, 1), Utc::now()).is_err());
        assert!(order
            .mark_paid(PaymentMethod::Efectivo, None, Utc::now())
            .is_err());
    }

    #[test]
    fn test_ticket_only_for_paid_orders() {
        let mut order = table();
        order.add_line(line("Pizza", 900_000, 1), Utc::now()).unwrap();
        assert!(order.ticket("t-1").is_none());

        order
            .mark_paid(PaymentMethod::Efectivo, None, Utc::now())
            .unwrap();
        let ticket = order.ticket("t-1").unwrap();
        assert_eq!(ticket.total_cents, 900_000);
        assert_eq!(ticket.payment_method, PaymentMethod::Efectivo);
        assert_eq!(ticket.number, Some(4));
    }

    #[test]
    fn test_clear_requires_paid_or_empty() {
        let mut order = table();
        order.add_line(line("Pizza", 900_000, 1), Utc::now()).unwrap();
        assert!(order.clear(Utc::now()).is_err());

        order
            .mark_paid(PaymentMethod::Efectivo, None, Utc::now())
            .unwrap();
        order.clear(Utc::now()).unwrap();

        assert_eq!(order.status, OrderStatus::Libre);
        assert!(order.lines.is_empty());
        assert_eq!(order.total_cents, 0);
        assert!(order.payment_method.is_none());
    }

    #[test]
    fn test_sale_reason() {
        assert_eq!(table().sale_reason(), "Venta mesa 4");
        let delivery = Order::new("o-3", "r", OrderKind::Delivery, None, None, Utc::now());
        assert_eq!(delivery.sale_reason(), "Venta delivery");
    }

    #[test]
    fn test_shift_worked_minutes() {
        let now = Utc::now();
        let shift = Shift {
            id: "s".into(),
            restaurant_id: "r".into(),
            user_id: "u".into(),
            opened_at: now - Duration::minutes(90),
            closed_at: None,
        };
        assert!(shift.is_open());
        assert_eq!(shift.worked_minutes(now), 90);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&OrderStatus::Pagado).unwrap(), "\"pagado\"");
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Efectivo).unwrap(),
            "\"efectivo\""
        );
        assert_eq!(OrderKind::Takeaway.to_string(), "takeaway");
    }

    #[test]
    fn test_restaurant_token_not_serialized() {
        let r = Restaurant {
            id: "r".into(),
            name: "R".into(),
            gateway_access_token: Some("APP_USR-secret".into()),
            created_at: Utc::now(),
        };
        assert!(r.has_gateway());
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("secret"));
    }
}
