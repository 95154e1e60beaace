//! # Inventory Repository
//!
//! Drinks (bebidas) and raw materials (materias primas), plus the stock
//! decrement applied when lines are sold.
//!
//! ## Applying a Sale
//! ```text
//! apply_sale(lines)
//!   BEGIN
//!   ├── SELECT drinks, raw_materials       (snapshot inside the tx)
//!   ├── plan_stock_decrement (mesa-core)   drinks first, floor at 0
//!   ├── UPDATE each changed row
//!   └── warn! per unmatched line name
//!   COMMIT
//! ```
//!
//! Not idempotent: applying the same lines twice decrements twice.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use mesa_core::inventory::{plan_stock_decrement, StockPlan, StockTarget};
use mesa_core::{Drink, OrderLine, RawMaterial};

const DRINK_COLUMNS: &str = "id, restaurant_id, name, price_cents, stock, enabled, created_at, updated_at";

const RAW_MATERIAL_COLUMNS: &str = "id, restaurant_id, name, unit, stock, created_at, updated_at";

/// Repository for stocked items.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    // =========================================================================
    // Drinks
    // =========================================================================

    pub async fn drinks(&self, restaurant_id: &str) -> DbResult<Vec<Drink>> {
        let mut conn = self.pool.acquire().await?;
        fetch_drinks(&mut conn, restaurant_id).await
    }

    pub async fn get_drink(&self, restaurant_id: &str, id: &str) -> DbResult<Option<Drink>> {
        let sql = format!("SELECT {DRINK_COLUMNS} FROM drinks WHERE restaurant_id = ?1 AND id = ?2");

        let drink = sqlx::query_as::<_, Drink>(&sql)
            .bind(restaurant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(drink)
    }

    pub async fn insert_drink(&self, drink: &Drink) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO drinks (id, restaurant_id, name, price_cents, stock, enabled, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&drink.id)
        .bind(&drink.restaurant_id)
        .bind(&drink.name)
        .bind(drink.price_cents)
        .bind(drink.stock)
        .bind(drink.enabled)
        .bind(drink.created_at)
        .bind(drink.updated_at)
        .execute(&self.pool)
        .await?;

        info!(restaurant_id = %drink.restaurant_id, drink = %drink.name, stock = drink.stock, "Drink created");
        Ok(())
    }

    pub async fn update_drink(&self, drink: &Drink) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE drinks
            SET name = ?3, price_cents = ?4, stock = ?5, enabled = ?6, updated_at = ?7
            WHERE restaurant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&drink.restaurant_id)
        .bind(&drink.id)
        .bind(&drink.name)
        .bind(drink.price_cents)
        .bind(drink.stock)
        .bind(drink.enabled)
        .bind(drink.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Drink", &drink.id));
        }
        Ok(())
    }

    pub async fn delete_drink(&self, restaurant_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM drinks WHERE restaurant_id = ?1 AND id = ?2")
            .bind(restaurant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Drink", id));
        }
        Ok(())
    }

    // =========================================================================
    // Raw Materials
    // =========================================================================

    pub async fn raw_materials(&self, restaurant_id: &str) -> DbResult<Vec<RawMaterial>> {
        let mut conn = self.pool.acquire().await?;
        fetch_raw_materials(&mut conn, restaurant_id).await
    }

    pub async fn get_raw_material(&self, restaurant_id: &str, id: &str) -> DbResult<Option<RawMaterial>> {
        let sql = format!(
            "SELECT {RAW_MATERIAL_COLUMNS} FROM raw_materials WHERE restaurant_id = ?1 AND id = ?2"
        );

        let material = sqlx::query_as::<_, RawMaterial>(&sql)
            .bind(restaurant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(material)
    }

    pub async fn insert_raw_material(&self, material: &RawMaterial) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO raw_materials (id, restaurant_id, name, unit, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&material.id)
        .bind(&material.restaurant_id)
        .bind(&material.name)
        .bind(&material.unit)
        .bind(material.stock)
        .bind(material.created_at)
        .bind(material.updated_at)
        .execute(&self.pool)
        .await?;

        info!(restaurant_id = %material.restaurant_id, material = %material.name, "Raw material created");
        Ok(())
    }

    pub async fn update_raw_material(&self, material: &RawMaterial) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE raw_materials
            SET name = ?3, unit = ?4, stock = ?5, updated_at = ?6
            WHERE restaurant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&material.restaurant_id)
        .bind(&material.id)
        .bind(&material.name)
        .bind(&material.unit)
        .bind(material.stock)
        .bind(material.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Raw material", &material.id));
        }
        Ok(())
    }

    pub async fn delete_raw_material(&self, restaurant_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM raw_materials WHERE restaurant_id = ?1 AND id = ?2")
            .bind(restaurant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Raw material", id));
        }
        Ok(())
    }

    // =========================================================================
    // Stock Decrement
    // =========================================================================

    /// Decrements stock for sold lines and reports what changed.
    ///
    /// Lines that match no drink or raw material are skipped with a warning.
    pub async fn apply_sale(&self, restaurant_id: &str, lines: &[OrderLine]) -> DbResult<StockPlan> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let drinks = fetch_drinks(&mut tx, restaurant_id).await?;
        let materials = fetch_raw_materials(&mut tx, restaurant_id).await?;
        let plan = plan_stock_decrement(lines, &drinks, &materials);

        for change in &plan.changes {
            let sql = match change.target {
                StockTarget::Drink => "UPDATE drinks SET stock = ?3, updated_at = ?4 WHERE restaurant_id = ?1 AND id = ?2",
                StockTarget::RawMaterial => {
                    "UPDATE raw_materials SET stock = ?3, updated_at = ?4 WHERE restaurant_id = ?1 AND id = ?2"
                }
            };

            sqlx::query(sql)
                .bind(restaurant_id)
                .bind(&change.id)
                .bind(change.new_stock)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        for name in &plan.unmatched {
            warn!(restaurant_id, item = %name, "No stock item matches sold line");
        }
        info!(
            restaurant_id,
            changed = plan.changes.len(),
            unmatched = plan.unmatched.len(),
            "Stock decremented"
        );
        Ok(plan)
    }
}

async fn fetch_drinks(conn: &mut SqliteConnection, restaurant_id: &str) -> DbResult<Vec<Drink>> {
    let sql = format!("SELECT {DRINK_COLUMNS} FROM drinks WHERE restaurant_id = ?1 ORDER BY name");

    let drinks = sqlx::query_as::<_, Drink>(&sql)
        .bind(restaurant_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(drinks)
}

async fn fetch_raw_materials(conn: &mut SqliteConnection, restaurant_id: &str) -> DbResult<Vec<RawMaterial>> {
    let sql =
        format!("SELECT {RAW_MATERIAL_COLUMNS} FROM raw_materials WHERE restaurant_id = ?1 ORDER BY name");

    let materials = sqlx::query_as::<_, RawMaterial>(&sql)
        .bind(restaurant_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(materials)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::new_id;
    use crate::repository::test_support::{restaurant_db, RID};
    use mesa_core::inventory::StockTarget;
    use mesa_core::{Drink, OrderLine, RawMaterial};

    fn drink(name: &str, stock: i64) -> Drink {
        let now = Utc::now();
        Drink {
            id: new_id(),
            restaurant_id: RID.to_string(),
            name: name.to_string(),
            price_cents: 250_000,
            stock,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn material(name: &str, stock: i64) -> RawMaterial {
        let now = Utc::now();
        RawMaterial {
            id: new_id(),
            restaurant_id: RID.to_string(),
            name: name.to_string(),
            unit: "unidad".to_string(),
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    fn sold(name: &str, quantity: i64) -> OrderLine {
        OrderLine {
            product_id: None,
            name: name.to_string(),
            unit_price_cents: 100,
            quantity,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_apply_sale_twice_decrements_twice_with_floor() {
        let db = restaurant_db().await;
        let inventory = db.inventory();
        let coca = drink("Coca Cola", 3);
        inventory.insert_drink(&coca).await.unwrap();

        let lines = vec![sold("coca cola", 2)];
        let first = inventory.apply_sale(RID, &lines).await.unwrap();
        assert_eq!(first.changes[0].new_stock, 1);

        let second = inventory.apply_sale(RID, &lines).await.unwrap();
        assert_eq!(second.changes[0].previous, 1);
        assert_eq!(second.changes[0].new_stock, 0);

        assert_eq!(inventory.get_drink(RID, &coca.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_apply_sale_falls_back_to_raw_materials() {
        let db = restaurant_db().await;
        let inventory = db.inventory();
        inventory.insert_drink(&drink("Agua", 10)).await.unwrap();
        let pan = material("Pan de hamburguesa", 20);
        inventory.insert_raw_material(&pan).await.unwrap();

        let plan = inventory
            .apply_sale(RID, &[sold("Hamburguesa", 4), sold("Empanada", 1)])
            .await
            .unwrap();

        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].target, StockTarget::RawMaterial);
        assert_eq!(plan.unmatched, vec!["Empanada".to_string()]);
        assert_eq!(inventory.get_raw_material(RID, &pan.id).await.unwrap().unwrap().stock, 16);
    }

    #[tokio::test]
    async fn test_drink_crud() {
        let db = restaurant_db().await;
        let inventory = db.inventory();
        let mut fernet = drink("Fernet", 5);
        inventory.insert_drink(&fernet).await.unwrap();

        fernet.stock = 12;
        inventory.update_drink(&fernet).await.unwrap();
        assert_eq!(inventory.drinks(RID).await.unwrap()[0].stock, 12);

        inventory.delete_drink(RID, &fernet.id).await.unwrap();
        assert!(inventory.drinks(RID).await.unwrap().is_empty());
        assert!(inventory.delete_drink(RID, &fernet.id).await.is_err());
    }
}
