//! # Restaurant Repository
//!
//! Tenant roots. A restaurant is created together with its first admin.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::employee::insert_employee;
use mesa_core::{Employee, Restaurant};

/// Repository for restaurants (tenants).
#[derive(Debug, Clone)]
pub struct RestaurantRepository {
    pool: SqlitePool,
}

impl RestaurantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RestaurantRepository { pool }
    }

    /// Inserts the tenant and its admin employee in one transaction.
    ///
    /// A taken slug surfaces as [`DbError::UniqueViolation`].
    pub async fn create_with_admin(&self, restaurant: &Restaurant, admin: &Employee) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO restaurants (id, name, gateway_access_token, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&restaurant.id)
        .bind(&restaurant.name)
        .bind(&restaurant.gateway_access_token)
        .bind(restaurant.created_at)
        .execute(&mut *tx)
        .await?;

        insert_employee(&mut tx, admin).await?;
        tx.commit().await?;

        info!(restaurant_id = %restaurant.id, admin = %admin.email, "Restaurant created");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Restaurant>> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            "SELECT id, name, gateway_access_token, created_at FROM restaurants WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(restaurant)
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM restaurants WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Stores (or clears) the processor access token.
    pub async fn set_gateway_token(&self, id: &str, token: Option<&str>) -> DbResult<()> {
        let result = sqlx::query("UPDATE restaurants SET gateway_access_token = ?2 WHERE id = ?1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Restaurant", id));
        }

        info!(restaurant_id = %id, configured = token.is_some(), "Gateway credential updated");
        Ok(())
    }
}
