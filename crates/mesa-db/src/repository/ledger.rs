//! # Ledger Repository
//!
//! Incomes (ingresos), expenses (egresos), the virtual money ledger (dinero)
//! and the processor transaction log.
//!
//! ## Money Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_income(efectivo) ──► incomes                                    │
//! │  record_income(virtual)  ──► incomes + virtual_movements (+amount)      │
//! │  record_expense(efectivo)──► expenses                                   │
//! │  record_expense(virtual) ──► expenses + virtual_movements (−amount)     │
//! │                                                                         │
//! │  record_gateway_payment  ──► payment_transactions (unique per           │
//! │                              restaurant, payment id, status)            │
//! │                              └── approved: settle the referenced order  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each call is one transaction: a crash never leaves an income without its
//! virtual movement.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::new_id;
use crate::repository::order::{clear_in, fetch_order, settle_in, Settlement};
use mesa_core::payment::{decide, GatewayPayment, WebhookDecision};
use mesa_core::{
    Expense, Income, IncomeSource, OrderKind, PaymentMethod, PaymentTransaction, VirtualMovement,
};

/// Outcome of logging a processor notification.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GatewayRecord {
    /// Same payment id and status was already logged. Nothing changed.
    Duplicate,
    /// Logged; `settlement` is set when an order was marked paid.
    #[serde(rename_all = "camelCase")]
    Recorded {
        transaction: PaymentTransaction,
        settlement: Option<Settlement>,
        liberated: bool,
    },
}

/// Repository for ledger operations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // =========================================================================
    // Incomes
    // =========================================================================

    /// Records a manual income with its payment method.
    pub async fn record_income(
        &self,
        restaurant_id: &str,
        amount_cents: i64,
        reason: &str,
        method: PaymentMethod,
    ) -> DbResult<Income> {
        let now = Utc::now();
        let income = Income {
            id: new_id(),
            restaurant_id: restaurant_id.to_string(),
            amount_cents,
            reason: reason.to_string(),
            payment_method: Some(method),
            source: IncomeSource::Manual,
            order_id: None,
            created_at: now,
        };

        let mut tx = self.pool.begin().await?;
        insert_income(&mut tx, &income).await?;
        if method == PaymentMethod::Virtual {
            let movement = movement(restaurant_id, amount_cents, reason, None, now);
            insert_virtual_movement(&mut tx, &movement).await?;
        }
        tx.commit().await?;

        info!(restaurant_id, amount = amount_cents, method = %method, "Income recorded");
        Ok(income)
    }

    /// Incomes since `since` (all time when `None`), newest first.
    pub async fn list_incomes(
        &self,
        restaurant_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Income>> {
        let incomes = sqlx::query_as::<_, Income>(
            r#"
            SELECT id, restaurant_id, amount_cents, reason, payment_method, source,
                   order_id, created_at
            FROM incomes
            WHERE restaurant_id = ?1 AND (?2 IS NULL OR created_at >= ?2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(restaurant_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(incomes)
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Records an expense taken from the given account.
    pub async fn record_expense(
        &self,
        restaurant_id: &str,
        amount_cents: i64,
        reason: &str,
        account: PaymentMethod,
    ) -> DbResult<Expense> {
        let now = Utc::now();
        let expense = Expense {
            id: new_id(),
            restaurant_id: restaurant_id.to_string(),
            amount_cents,
            reason: reason.to_string(),
            account,
            created_at: now,
        };

        let mut tx = self.pool.begin().await?;
        insert_expense(&mut tx, &expense).await?;
        if account == PaymentMethod::Virtual {
            let movement = movement(restaurant_id, -amount_cents, reason, None, now);
            insert_virtual_movement(&mut tx, &movement).await?;
        }
        tx.commit().await?;

        info!(restaurant_id, amount = amount_cents, account = %account, "Expense recorded");
        Ok(expense)
    }

    pub async fn list_expenses(
        &self,
        restaurant_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, restaurant_id, amount_cents, reason, account, created_at
            FROM expenses
            WHERE restaurant_id = ?1 AND (?2 IS NULL OR created_at >= ?2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(restaurant_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    // =========================================================================
    // Virtual Money (Dinero)
    // =========================================================================

    pub async fn virtual_movements(
        &self,
        restaurant_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<VirtualMovement>> {
        let movements = sqlx::query_as::<_, VirtualMovement>(
            r#"
            SELECT id, restaurant_id, amount_cents, reason, reference, created_at
            FROM virtual_movements
            WHERE restaurant_id = ?1 AND (?2 IS NULL OR created_at >= ?2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(restaurant_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Current processor balance in centavos.
    pub async fn virtual_balance(&self, restaurant_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM virtual_movements WHERE restaurant_id = ?1",
        )
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    // =========================================================================
    // Processor Transactions
    // =========================================================================

    /// Logs a fetched processor payment and applies it.
    ///
    /// ## Steps (one transaction)
    /// 1. Insert the log row; on conflict return [`GatewayRecord::Duplicate`]
    /// 2. Approved with a reference: settle that order as virtual
    /// 3. Optionally liberate it when it is a table
    ///
    /// Orders that are missing or already paid are logged and left alone.
    pub async fn record_gateway_payment(
        &self,
        restaurant_id: &str,
        payment: &GatewayPayment,
        liberate_tables: bool,
    ) -> DbResult<GatewayRecord> {
        let now = Utc::now();
        let mut transaction = PaymentTransaction {
            id: new_id(),
            restaurant_id: restaurant_id.to_string(),
            gateway_payment_id: payment.id.clone(),
            status: payment.status.to_string(),
            amount_cents: payment.transaction_amount_cents,
            external_reference: payment.external_reference.clone(),
            order_id: None,
            received_at: now,
        };

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO payment_transactions (
                id, restaurant_id, gateway_payment_id, status, amount_cents,
                external_reference, order_id, received_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (restaurant_id, gateway_payment_id, status) DO NOTHING
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.restaurant_id)
        .bind(&transaction.gateway_payment_id)
        .bind(&transaction.status)
        .bind(transaction.amount_cents)
        .bind(&transaction.external_reference)
        .bind(&transaction.order_id)
        .bind(transaction.received_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            warn!(
                restaurant_id,
                payment_id = %payment.id,
                status = %payment.status,
                "Duplicate processor notification ignored"
            );
            return Ok(GatewayRecord::Duplicate);
        }

        let mut settlement = None;
        let mut liberated = false;

        if let WebhookDecision::Settle { order_id, amount } = decide(payment) {
            match fetch_order(&mut tx, restaurant_id, &order_id).await? {
                None => warn!(restaurant_id, order_id = %order_id, "Approved payment for unknown order"),
                Some(order) if order.is_paid() => {
                    warn!(restaurant_id, order_id = %order_id, "Approved payment for an order already paid")
                }
                Some(order) if order.total() != amount => {
                    warn!(
                        restaurant_id,
                        order_id = %order_id,
                        expected = order.total_cents,
                        received = amount.cents(),
                        "Approved payment does not match the order total"
                    )
                }
                Some(order) => {
                    let settled = settle_in(
                        &mut tx,
                        restaurant_id,
                        &order_id,
                        PaymentMethod::Virtual,
                        Some(payment.id.clone()),
                        now,
                    )
                    .await?;

                    if liberate_tables && order.kind == OrderKind::Mesa {
                        clear_in(&mut tx, restaurant_id, &order_id, now).await?;
                        liberated = true;
                    }

                    sqlx::query("UPDATE payment_transactions SET order_id = ?1 WHERE id = ?2")
                        .bind(&order_id)
                        .bind(&transaction.id)
                        .execute(&mut *tx)
                        .await?;
                    transaction.order_id = Some(order_id);
                    settlement = Some(settled);
                }
            }
        }

        tx.commit().await?;

        info!(
            restaurant_id,
            payment_id = %payment.id,
            status = %payment.status,
            settled = settlement.is_some(),
            liberated,
            "Processor payment recorded"
        );

        Ok(GatewayRecord::Recorded {
            transaction,
            settlement,
            liberated,
        })
    }

    pub async fn transactions(&self, restaurant_id: &str) -> DbResult<Vec<PaymentTransaction>> {
        let rows = sqlx::query_as::<_, PaymentTransaction>(
            r#"
            SELECT id, restaurant_id, gateway_payment_id, status, amount_cents,
                   external_reference, order_id, received_at
            FROM payment_transactions
            WHERE restaurant_id = ?1
            ORDER BY received_at DESC
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Connection-Level Helpers
// =============================================================================

fn movement(
    restaurant_id: &str,
    amount_cents: i64,
    reason: &str,
    reference: Option<String>,
    now: DateTime<Utc>,
) -> VirtualMovement {
    VirtualMovement {
        id: new_id(),
        restaurant_id: restaurant_id.to_string(),
        amount_cents,
        reason: reason.to_string(),
        reference,
        created_at: now,
    }
}

pub(crate) async fn insert_income(conn: &mut SqliteConnection, income: &Income) -> DbResult<()> {
    debug!(id = %income.id, amount = income.amount_cents, "Inserting income");

    sqlx::query(
        r#"
        INSERT INTO incomes (
            id, restaurant_id, amount_cents, reason, payment_method, source, order_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&income.id)
    .bind(&income.restaurant_id)
    .bind(income.amount_cents)
    .bind(&income.reason)
    .bind(income.payment_method)
    .bind(income.source)
    .bind(&income.order_id)
    .bind(income.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_expense(conn: &mut SqliteConnection, expense: &Expense) -> DbResult<()> {
    debug!(id = %expense.id, amount = expense.amount_cents, "Inserting expense");

    sqlx::query(
        r#"
        INSERT INTO expenses (id, restaurant_id, amount_cents, reason, account, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&expense.id)
    .bind(&expense.restaurant_id)
    .bind(expense.amount_cents)
    .bind(&expense.reason)
    .bind(expense.account)
    .bind(expense.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_virtual_movement(
    conn: &mut SqliteConnection,
    movement: &VirtualMovement,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO virtual_movements (id, restaurant_id, amount_cents, reason, reference, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.restaurant_id)
    .bind(movement.amount_cents)
    .bind(&movement.reason)
    .bind(&movement.reference)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::GatewayRecord;
    use crate::repository::test_support::{restaurant_db, RID};
    use mesa_core::payment::{GatewayPayment, GatewayPaymentStatus};
    use mesa_core::{Order, OrderKind, OrderLine, OrderStatus, PaymentMethod};

    fn payment(id: &str, status: GatewayPaymentStatus, reference: Option<&str>) -> GatewayPayment {
        GatewayPayment {
            id: id.into(),
            status,
            external_reference: reference.map(String::from),
            transaction_amount_cents: 500_000,
            payment_method_id: None,
        }
    }

    async fn open_table(db: &crate::Database, id: &str, number: i64) {
        let mut order = Order::new(id, RID, OrderKind::Mesa, Some(number), None, chrono::Utc::now());
        order
            .add_line(
                OrderLine {
                    product_id: None,
                    name: "Parrillada".into(),
                    unit_price_cents: 500_000,
                    quantity: 1,
                    notes: None,
                },
                chrono::Utc::now(),
            )
            .unwrap();
        db.orders().insert(&order).await.unwrap();
    }

    #[tokio::test]
    async fn test_virtual_income_and_expense_move_balance() {
        let db = restaurant_db().await;
        let ledger = db.ledger();

        ledger.record_income(RID, 10_000, "Depósito", PaymentMethod::Virtual).await.unwrap();
        ledger.record_income(RID, 4_000, "Cambio", PaymentMethod::Efectivo).await.unwrap();
        ledger.record_expense(RID, 2_500, "Proveedor", PaymentMethod::Virtual).await.unwrap();

        assert_eq!(ledger.virtual_balance(RID).await.unwrap(), 7_500);
        assert_eq!(ledger.list_incomes(RID, None).await.unwrap().len(), 2);
        assert_eq!(ledger.list_expenses(RID, None).await.unwrap().len(), 1);
        assert_eq!(ledger.virtual_movements(RID, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_since_filters_older_rows() {
        let db = restaurant_db().await;
        let ledger = db.ledger();
        ledger.record_income(RID, 100, "a", PaymentMethod::Efectivo).await.unwrap();

        let future = chrono::Utc::now() + chrono::Duration::hours(1);
        assert!(ledger.list_incomes(RID, Some(future)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_approved_payment_settles_referenced_order() {
        let db = restaurant_db().await;
        open_table(&db, "mesa-5", 5).await;

        let record = db
            .ledger()
            .record_gateway_payment(RID, &payment("p1", GatewayPaymentStatus::Approved, Some("mesa-5")), false)
            .await
            .unwrap();

        let GatewayRecord::Recorded { transaction, settlement, liberated } = record else {
            panic!("expected recorded");
        };
        assert_eq!(transaction.order_id.as_deref(), Some("mesa-5"));
        assert!(settlement.is_some());
        assert!(!liberated);

        let order = db.orders().get(RID, "mesa-5").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pagado);
        assert_eq!(order.payment_method, Some(PaymentMethod::Virtual));
    }

    #[tokio::test]
    async fn test_pending_payment_never_settles() {
        let db = restaurant_db().await;
        open_table(&db, "mesa-6", 6).await;

        for status in [GatewayPaymentStatus::Pending, GatewayPaymentStatus::Rejected] {
            db.ledger()
                .record_gateway_payment(RID, &payment("p2", status, Some("mesa-6")), false)
                .await
                .unwrap();
        }

        let order = db.orders().get(RID, "mesa-6").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Abierta);
        assert_eq!(db.ledger().transactions(RID).await.unwrap().len(), 2);
        assert!(db.orders().tickets(RID, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_delivery_logs_once() {
        let db = restaurant_db().await;
        open_table(&db, "mesa-7", 7).await;
        let approved = payment("p3", GatewayPaymentStatus::Approved, Some("mesa-7"));

        let first = db.ledger().record_gateway_payment(RID, &approved, false).await.unwrap();
        let second = db.ledger().record_gateway_payment(RID, &approved, false).await.unwrap();

        assert!(matches!(first, GatewayRecord::Recorded { .. }));
        assert!(matches!(second, GatewayRecord::Duplicate));
        assert_eq!(db.ledger().transactions(RID).await.unwrap().len(), 1);
        assert_eq!(db.orders().tickets(RID, None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_liberation_clears_only_the_referenced_table() {
        let db = restaurant_db().await;
        open_table(&db, "mesa-8", 8).await;
        open_table(&db, "mesa-9", 9).await;

        let record = db
            .ledger()
            .record_gateway_payment(RID, &payment("p4", GatewayPaymentStatus::Approved, Some("mesa-8")), true)
            .await
            .unwrap();
        assert!(matches!(record, GatewayRecord::Recorded { liberated: true, .. }));

        let paid = db.orders().get(RID, "mesa-8").await.unwrap().unwrap();
        assert_eq!(paid.status, OrderStatus::Libre);
        let other = db.orders().get(RID, "mesa-9").await.unwrap().unwrap();
        assert_eq!(other.status, OrderStatus::Abierta);
        assert_eq!(db.orders().tickets(RID, None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_short_payment_is_logged_without_settlement() {
        let db = restaurant_db().await;
        open_table(&db, "mesa-10", 10).await;

        let mut short = payment("p6", GatewayPaymentStatus::Approved, Some("mesa-10"));
        short.transaction_amount_cents = 100;
        let record = db.ledger().record_gateway_payment(RID, &short, true).await.unwrap();

        let GatewayRecord::Recorded { transaction, settlement, liberated } = record else {
            panic!("expected recorded");
        };
        assert!(settlement.is_none());
        assert!(!liberated);
        assert!(transaction.order_id.is_none());
        assert_eq!(transaction.amount_cents, 100);

        let order = db.orders().get(RID, "mesa-10").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Abierta);
        assert!(db.orders().tickets(RID, None, None).await.unwrap().is_empty());
        assert_eq!(db.ledger().virtual_balance(RID).await.unwrap(), 0);
        assert_eq!(db.ledger().transactions(RID).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_order_is_logged_without_settlement() {
        let db = restaurant_db().await;
        let record = db
            .ledger()
            .record_gateway_payment(RID, &payment("p5", GatewayPaymentStatus::Approved, Some("nope")), false)
            .await
            .unwrap();
        assert!(matches!(record, GatewayRecord::Recorded { settlement: None, .. }));
    }
}
