//! # Shift Repository
//!
//! Employee shift history (historial de empleados).
//!
//! ## One Open Shift Per Employee
//! ```text
//! login ──► open()  ── INSERT ... ON CONFLICT DO NOTHING ──► SELECT open shift
//!                       (partial unique index: restaurant_id, user_id
//!                        WHERE closed_at IS NULL)
//!
//! login again ──► open() ──► same row, no duplicate
//! logout ──► close() ──► closed_at = now
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::new_id;
use mesa_core::Shift;

/// Repository for employee shifts.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Opens a shift for the employee, or returns the one already open.
    pub async fn open(&self, restaurant_id: &str, user_id: &str) -> DbResult<Shift> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query(
            r#"
            INSERT INTO employee_shifts (id, restaurant_id, user_id, opened_at, closed_at)
            VALUES (?1, ?2, ?3, ?4, NULL)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(new_id())
        .bind(restaurant_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        let shift = sqlx::query_as::<_, Shift>(
            r#"
            SELECT id, restaurant_id, user_id, opened_at, closed_at
            FROM employee_shifts
            WHERE restaurant_id = ?1 AND user_id = ?2 AND closed_at IS NULL
            "#,
        )
        .bind(restaurant_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if created {
            info!(restaurant_id, user_id, shift_id = %shift.id, "Shift opened");
        } else {
            debug!(restaurant_id, user_id, shift_id = %shift.id, "Shift already open");
        }
        Ok(shift)
    }

    /// Closes the employee's open shift.
    pub async fn close(&self, restaurant_id: &str, user_id: &str) -> DbResult<Shift> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut shift = sqlx::query_as::<_, Shift>(
            r#"
            SELECT id, restaurant_id, user_id, opened_at, closed_at
            FROM employee_shifts
            WHERE restaurant_id = ?1 AND user_id = ?2 AND closed_at IS NULL
            "#,
        )
        .bind(restaurant_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Open shift", user_id))?;

        sqlx::query("UPDATE employee_shifts SET closed_at = ?2 WHERE id = ?1")
            .bind(&shift.id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        shift.closed_at = Some(now);
        info!(
            restaurant_id,
            user_id,
            minutes = shift.worked_minutes(now),
            "Shift closed"
        );
        Ok(shift)
    }

    /// Shifts newest first, optionally for one employee or only open ones.
    pub async fn list(
        &self,
        restaurant_id: &str,
        user_id: Option<&str>,
        open_only: bool,
    ) -> DbResult<Vec<Shift>> {
        let shifts = sqlx::query_as::<_, Shift>(
            r#"
            SELECT id, restaurant_id, user_id, opened_at, closed_at
            FROM employee_shifts
            WHERE restaurant_id = ?1
              AND (?2 IS NULL OR user_id = ?2)
              AND (?3 = 0 OR closed_at IS NULL)
            ORDER BY opened_at DESC
            "#,
        )
        .bind(restaurant_id)
        .bind(user_id)
        .bind(open_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }
}
