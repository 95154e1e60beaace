//! # Order Repository
//!
//! Tables, takeaway and delivery orders, and the ticket archive.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE        insert() → Order { status: libre | abierta }         │
//! │                                                                         │
//! │  2. ADD LINES     Order::add_line() + save() → status: abierta         │
//! │                                                                         │
//! │  3. SETTLE        settle() in ONE transaction:                         │
//! │                   ├── order → pagado                                   │
//! │                   ├── ticket snapshot                                  │
//! │                   ├── income (source: venta, method recorded)          │
//! │                   └── virtual movement (virtual payments only)         │
//! │                                                                         │
//! │  4. LIBERATE      clear() → libre, no lines (tables are reused)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines and customer are stored as JSON on the order row.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::new_id;
use crate::repository::ledger::{insert_income, insert_virtual_movement};
use mesa_core::{
    Customer, Income, IncomeSource, Order, OrderKind, OrderLine, OrderStatus, PaymentMethod,
    Ticket, VirtualMovement,
};

const ORDER_COLUMNS: &str = "id, restaurant_id, kind, number, status, lines, total_cents, \
    customer, payment_method, payment_reference, created_at, updated_at, paid_at";

const TICKET_COLUMNS: &str = "id, restaurant_id, order_id, kind, number, lines, total_cents, \
    payment_method, payment_reference, issued_at";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    restaurant_id: String,
    kind: OrderKind,
    number: Option<i64>,
    status: OrderStatus,
    lines: String,
    total_cents: i64,
    customer: Option<String>,
    payment_method: Option<PaymentMethod>,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        let lines: Vec<OrderLine> = serde_json::from_str(&row.lines)?;
        let customer: Option<Customer> = row
            .customer
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Order {
            id: row.id,
            restaurant_id: row.restaurant_id,
            kind: row.kind,
            number: row.number,
            status: row.status,
            lines,
            total_cents: row.total_cents,
            customer,
            payment_method: row.payment_method,
            payment_reference: row.payment_reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
            paid_at: row.paid_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: String,
    restaurant_id: String,
    order_id: String,
    kind: OrderKind,
    number: Option<i64>,
    lines: String,
    total_cents: i64,
    payment_method: PaymentMethod,
    payment_reference: Option<String>,
    issued_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = DbError;

    fn try_from(row: TicketRow) -> DbResult<Self> {
        Ok(Ticket {
            id: row.id,
            restaurant_id: row.restaurant_id,
            order_id: row.order_id,
            kind: row.kind,
            number: row.number,
            lines: serde_json::from_str(&row.lines)?,
            total_cents: row.total_cents,
            payment_method: row.payment_method,
            payment_reference: row.payment_reference,
            issued_at: row.issued_at,
        })
    }
}

/// Everything written when an order is paid.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub order: Order,
    pub ticket: Ticket,
    pub income: Income,
    pub virtual_movement: Option<VirtualMovement>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order and ticket operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, kind = %order.kind, number = ?order.number, "Inserting order");

        let lines = serde_json::to_string(&order.lines)?;
        let customer = order.customer.as_ref().map(serde_json::to_string).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, restaurant_id, kind, number, status, lines, total_cents,
                customer, payment_method, payment_reference,
                created_at, updated_at, paid_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&order.id)
        .bind(&order.restaurant_id)
        .bind(order.kind)
        .bind(order.number)
        .bind(order.status)
        .bind(lines)
        .bind(order.total_cents)
        .bind(customer)
        .bind(order.payment_method)
        .bind(&order.payment_reference)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.paid_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, restaurant_id: &str, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, restaurant_id, id).await
    }

    /// Lists orders, optionally filtered by kind and status.
    ///
    /// Tables come back by number, the rest by creation time.
    pub async fn list(
        &self,
        restaurant_id: &str,
        kind: Option<OrderKind>,
        status: Option<OrderStatus>,
    ) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE restaurant_id = ?1 \
               AND (?2 IS NULL OR kind = ?2) \
               AND (?3 IS NULL OR status = ?3) \
             ORDER BY kind, number, created_at"
        );

        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(restaurant_id)
            .bind(kind)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Next sequence number for takeaway/delivery orders.
    pub async fn next_number(&self, restaurant_id: &str, kind: OrderKind) -> DbResult<i64> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(number) FROM orders WHERE restaurant_id = ?1 AND kind = ?2",
        )
        .bind(restaurant_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;

        Ok(max.unwrap_or(0) + 1)
    }

    /// Persists lines, status, totals and payment fields of an order.
    ///
    /// Refuses to overwrite a row that is paid in storage: paid orders only
    /// change through [`settle`](Self::settle) and [`clear`](Self::clear).
    pub async fn save(&self, order: &Order) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        update_order(&mut conn, order, Guard::Unpaid).await
    }

    /// Appends a line, reading and writing the order in one transaction.
    pub async fn add_line(
        &self,
        restaurant_id: &str,
        order_id: &str,
        line: OrderLine,
    ) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut order = fetch_order(&mut tx, restaurant_id, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;
        order.add_line(line, now)?;
        update_order(&mut tx, &order, Guard::Unpaid).await?;

        tx.commit().await?;
        debug!(order_id = %order_id, lines = order.lines.len(), total = order.total_cents, "Line added");
        Ok(order)
    }

    /// Removes the line at `index` in one transaction.
    pub async fn remove_line(
        &self,
        restaurant_id: &str,
        order_id: &str,
        index: usize,
    ) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut order = fetch_order(&mut tx, restaurant_id, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;
        order.remove_line(index, now)?;
        update_order(&mut tx, &order, Guard::Unpaid).await?;

        tx.commit().await?;
        debug!(order_id = %order_id, lines = order.lines.len(), total = order.total_cents, "Line removed");
        Ok(order)
    }

    pub async fn delete(&self, restaurant_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1 AND restaurant_id = ?2")
            .bind(id)
            .bind(restaurant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    /// Marks an order paid and records the sale, all in one transaction.
    pub async fn settle(
        &self,
        restaurant_id: &str,
        order_id: &str,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> DbResult<Settlement> {
        let mut tx = self.pool.begin().await?;
        let settlement =
            settle_in(&mut tx, restaurant_id, order_id, method, reference, Utc::now()).await?;
        tx.commit().await?;

        info!(
            order_id = %order_id,
            method = %method,
            total = settlement.order.total_cents,
            "Order settled"
        );
        Ok(settlement)
    }

    /// Liberates an order: back to `libre` with no lines.
    pub async fn clear(&self, restaurant_id: &str, order_id: &str) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;
        let order = clear_in(&mut tx, restaurant_id, order_id, Utc::now()).await?;
        tx.commit().await?;

        info!(order_id = %order_id, "Order liberated");
        Ok(order)
    }

    /// Paid-order archive, newest first.
    pub async fn tickets(
        &self,
        restaurant_id: &str,
        kind: Option<OrderKind>,
        since: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Ticket>> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets \
             WHERE restaurant_id = ?1 \
               AND (?2 IS NULL OR kind = ?2) \
               AND (?3 IS NULL OR issued_at >= ?3) \
             ORDER BY issued_at DESC"
        );

        let rows: Vec<TicketRow> = sqlx::query_as(&sql)
            .bind(restaurant_id)
            .bind(kind)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Ticket::try_from).collect()
    }
}

// =============================================================================
// Connection-Level Helpers (shared with the ledger transaction)
// =============================================================================

pub(crate) async fn fetch_order(
    conn: &mut SqliteConnection,
    restaurant_id: &str,
    id: &str,
) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND restaurant_id = ?2");

    let row: Option<OrderRow> = sqlx::query_as(&sql)
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(Order::try_from).transpose()
}

/// Which stored states an order update may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    /// Only rows not yet paid.
    Unpaid,
    /// Any row. Used by liberation, which is the one way out of `pagado`.
    Any,
}

async fn update_order(conn: &mut SqliteConnection, order: &Order, guard: Guard) -> DbResult<()> {
    let lines = serde_json::to_string(&order.lines)?;
    let customer = order.customer.as_ref().map(serde_json::to_string).transpose()?;

    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = ?3,
            lines = ?4,
            total_cents = ?5,
            customer = ?6,
            payment_method = ?7,
            payment_reference = ?8,
            updated_at = ?9,
            paid_at = ?10
        WHERE id = ?1 AND restaurant_id = ?2
          AND (?11 = 0 OR status != 'pagado')
        "#,
    )
    .bind(&order.id)
    .bind(&order.restaurant_id)
    .bind(order.status)
    .bind(lines)
    .bind(order.total_cents)
    .bind(customer)
    .bind(order.payment_method)
    .bind(&order.payment_reference)
    .bind(order.updated_at)
    .bind(order.paid_at)
    .bind(guard == Guard::Unpaid)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return match fetch_order(&mut *conn, &order.restaurant_id, &order.id).await? {
            Some(_) => {
                warn!(order_id = %order.id, "Write to a paid order rejected");
                Err(DbError::Conflict(format!("Order {} is already paid", order.id)))
            }
            None => Err(DbError::not_found("Order", &order.id)),
        };
    }

    Ok(())
}

async fn insert_ticket(conn: &mut SqliteConnection, ticket: &Ticket) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO tickets (
            id, restaurant_id, order_id, kind, number, lines, total_cents,
            payment_method, payment_reference, issued_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&ticket.id)
    .bind(&ticket.restaurant_id)
    .bind(&ticket.order_id)
    .bind(ticket.kind)
    .bind(ticket.number)
    .bind(serde_json::to_string(&ticket.lines)?)
    .bind(ticket.total_cents)
    .bind(ticket.payment_method)
    .bind(&ticket.payment_reference)
    .bind(ticket.issued_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn settle_in(
    conn: &mut SqliteConnection,
    restaurant_id: &str,
    order_id: &str,
    method: PaymentMethod,
    reference: Option<String>,
    now: DateTime<Utc>,
) -> DbResult<Settlement> {
    let mut order = fetch_order(&mut *conn, restaurant_id, order_id)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

    order.mark_paid(method, reference.clone(), now)?;
    update_order(&mut *conn, &order, Guard::Unpaid).await?;

    let ticket = order
        .ticket(new_id())
        .ok_or_else(|| DbError::Internal(format!("paid order {order_id} has no ticket")))?;
    insert_ticket(&mut *conn, &ticket).await?;

    let income = Income {
        id: new_id(),
        restaurant_id: restaurant_id.to_string(),
        amount_cents: order.total_cents,
        reason: order.sale_reason(),
        payment_method: Some(method),
        source: IncomeSource::Venta,
        order_id: Some(order.id.clone()),
        created_at: now,
    };
    insert_income(&mut *conn, &income).await?;

    let virtual_movement = match method {
        PaymentMethod::Virtual => {
            let movement = VirtualMovement {
                id: new_id(),
                restaurant_id: restaurant_id.to_string(),
                amount_cents: order.total_cents,
                reason: order.sale_reason(),
                reference,
                created_at: now,
            };
            insert_virtual_movement(&mut *conn, &movement).await?;
            Some(movement)
        }
        PaymentMethod::Efectivo => None,
    };

    Ok(Settlement {
        order,
        ticket,
        income,
        virtual_movement,
    })
}

pub(crate) async fn clear_in(
    conn: &mut SqliteConnection,
    restaurant_id: &str,
    order_id: &str,
    now: DateTime<Utc>,
) -> DbResult<Order> {
    let mut order = fetch_order(&mut *conn, restaurant_id, order_id)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

    order.clear(now)?;
    update_order(&mut *conn, &order, Guard::Any).await?;
    Ok(order)
}

// =============================================================================
// Unit Tests
// =============================================================================
