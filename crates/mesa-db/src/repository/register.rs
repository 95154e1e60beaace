//! # Cash Register Repository
//!
//! Caja registradora sessions: open with a float, extract cash, close with a
//! count. At most one register is open per restaurant (partial unique index).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use crate::error::DbResult;
use crate::new_id;
use crate::repository::ledger::insert_expense;
use mesa_core::register::{reconcile, synthetic_close, Reconciliation};
use mesa_core::{CashRegister, CoreError, Expense, Money, PaymentMethod};

const REGISTER_COLUMNS: &str =
    "id, restaurant_id, opening_cents, opened_at, closing_cents, closed_at, withdrawn_cents, updated_at";

/// Result of closing the register.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterClose {
    pub register: CashRegister,
    pub reconciliation: Reconciliation,
    /// No register was open; a same-instant record was written instead.
    pub synthetic: bool,
}

/// Repository for cash register operations.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// The open register, if any.
    pub async fn current(&self, restaurant_id: &str) -> DbResult<Option<CashRegister>> {
        let mut conn = self.pool.acquire().await?;
        fetch_open(&mut conn, restaurant_id).await
    }

    /// Past and present registers, newest first.
    pub async fn history(&self, restaurant_id: &str, limit: i64) -> DbResult<Vec<CashRegister>> {
        let sql = format!(
            "SELECT {REGISTER_COLUMNS} FROM cash_registers \
             WHERE restaurant_id = ?1 ORDER BY opened_at DESC LIMIT ?2"
        );

        let rows = sqlx::query_as::<_, CashRegister>(&sql)
            .bind(restaurant_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Opens the register with a counted float.
    pub async fn open(&self, restaurant_id: &str, opening_cents: i64) -> DbResult<CashRegister> {
        let mut tx = self.pool.begin().await?;

        if let Some(open) = fetch_open(&mut tx, restaurant_id).await? {
            return Err(CoreError::RegisterAlreadyOpen {
                opened_at: open.opened_at.to_rfc3339(),
            }
            .into());
        }

        let now = Utc::now();
        let register = CashRegister {
            id: new_id(),
            restaurant_id: restaurant_id.to_string(),
            opening_cents,
            opened_at: now,
            closing_cents: None,
            closed_at: None,
            withdrawn_cents: 0,
            updated_at: now,
        };
        insert_register(&mut tx, &register).await?;
        tx.commit().await?;

        info!(restaurant_id, opening = opening_cents, "Cash register opened");
        Ok(register)
    }

    /// Closes the open register with the counted cash.
    ///
    /// With no register open this still succeeds: a record opened and closed
    /// at the same instant is stored, with nothing to reconcile against.
    pub async fn close(&self, restaurant_id: &str, counted_cents: i64) -> DbResult<RegisterClose> {
        let now = Utc::now();
        let counted = Money::from_cents(counted_cents);
        let mut tx = self.pool.begin().await?;

        let result = match fetch_open(&mut tx, restaurant_id).await? {
            Some(mut register) => {
                let expected = expected_cash(&mut tx, &register).await?;

                sqlx::query(
                    r#"
                    UPDATE cash_registers
                    SET closing_cents = ?2, closed_at = ?3, updated_at = ?3
                    WHERE id = ?1
                    "#,
                )
                .bind(&register.id)
                .bind(counted_cents)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                register.closing_cents = Some(counted_cents);
                register.closed_at = Some(now);
                register.updated_at = now;

                RegisterClose {
                    register,
                    reconciliation: reconcile(expected, counted),
                    synthetic: false,
                }
            }
            None => {
                warn!(restaurant_id, "Closing cash register with none open");
                let register = synthetic_close(new_id(), restaurant_id, now, counted);
                insert_register(&mut tx, &register).await?;

                RegisterClose {
                    register,
                    reconciliation: reconcile(counted, counted),
                    synthetic: true,
                }
            }
        };

        tx.commit().await?;

        info!(
            restaurant_id,
            counted = counted_cents,
            difference = result.reconciliation.difference.cents(),
            "Cash register closed"
        );
        Ok(result)
    }

    /// Takes cash out of the open register and books it as a cash expense.
    pub async fn withdraw(
        &self,
        restaurant_id: &str,
        amount_cents: i64,
        reason: &str,
    ) -> DbResult<(CashRegister, Expense)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut register = fetch_open(&mut tx, restaurant_id)
            .await?
            .ok_or(CoreError::RegisterNotOpen)?;

        sqlx::query(
            r#"
            UPDATE cash_registers
            SET withdrawn_cents = withdrawn_cents + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&register.id)
        .bind(amount_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        register.withdrawn_cents += amount_cents;
        register.updated_at = now;

        let expense = Expense {
            id: new_id(),
            restaurant_id: restaurant_id.to_string(),
            amount_cents,
            reason: reason.to_string(),
            account: PaymentMethod::Efectivo,
            created_at: now,
        };
        insert_expense(&mut tx, &expense).await?;

        tx.commit().await?;

        info!(restaurant_id, amount = amount_cents, "Cash withdrawn from register");
        Ok((register, expense))
    }
}

async fn fetch_open(conn: &mut SqliteConnection, restaurant_id: &str) -> DbResult<Option<CashRegister>> {
    let sql = format!(
        "SELECT {REGISTER_COLUMNS} FROM cash_registers \
         WHERE restaurant_id = ?1 AND closed_at IS NULL"
    );

    let register = sqlx::query_as::<_, CashRegister>(&sql)
        .bind(restaurant_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(register)
}

async fn insert_register(conn: &mut SqliteConnection, register: &CashRegister) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cash_registers (
            id, restaurant_id, opening_cents, opened_at, closing_cents, closed_at,
            withdrawn_cents, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&register.id)
    .bind(&register.restaurant_id)
    .bind(register.opening_cents)
    .bind(register.opened_at)
    .bind(register.closing_cents)
    .bind(register.closed_at)
    .bind(register.withdrawn_cents)
    .bind(register.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Float plus cash incomes minus cash expenses since the register opened.
/// Extractions are cash expenses, so they are already subtracted.
async fn expected_cash(conn: &mut SqliteConnection, register: &CashRegister) -> DbResult<Money> {
    let since: DateTime<Utc> = register.opened_at;

    let cash_in: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT SUM(amount_cents) FROM incomes
        WHERE restaurant_id = ?1 AND created_at >= ?2
          AND (payment_method IS NULL OR payment_method = 'efectivo')
        "#,
    )
    .bind(&register.restaurant_id)
    .bind(since)
    .fetch_one(&mut *conn)
    .await?;

    let cash_out: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT SUM(amount_cents) FROM expenses
        WHERE restaurant_id = ?1 AND created_at >= ?2 AND account = 'efectivo'
        "#,
    )
    .bind(&register.restaurant_id)
    .bind(since)
    .fetch_one(&mut *conn)
    .await?;

    Ok(register.opening()
        + Money::from_cents(cash_in.unwrap_or(0))
        - Money::from_cents(cash_out.unwrap_or(0)))
}

// =============================================================================
// Unit Tests
// =============================================================================
