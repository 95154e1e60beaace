//! # Menu Repository
//!
//! Categories and the products listed under them.
//!
//! ## Cascade
//! ```text
//! categories (1) ──── (N) products      ON DELETE CASCADE
//!
//! delete_category("parrilla")
//!   ├── COUNT products of the category   ──► removed
//!   └── DELETE category                  ──► products go with it
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use mesa_core::{Category, Product};

const CATEGORY_COLUMNS: &str = "id, restaurant_id, name, enabled, position, created_at";

const PRODUCT_COLUMNS: &str = "id, restaurant_id, category_id, subcategory, name, price_cents, \
                               stock, enabled, created_at, updated_at";

/// Repository for the menu.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn categories(&self, restaurant_id: &str) -> DbResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE restaurant_id = ?1 ORDER BY position, name"
        );

        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(restaurant_id, count = categories.len(), "Listed categories");
        Ok(categories)
    }

    pub async fn get_category(&self, restaurant_id: &str, id: &str) -> DbResult<Option<Category>> {
        let sql =
            format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE restaurant_id = ?1 AND id = ?2");

        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(restaurant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    pub async fn insert_category(&self, category: &Category) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, restaurant_id, name, enabled, position, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&category.id)
        .bind(&category.restaurant_id)
        .bind(&category.name)
        .bind(category.enabled)
        .bind(category.position)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        info!(restaurant_id = %category.restaurant_id, category = %category.name, "Category created");
        Ok(())
    }

    pub async fn update_category(&self, category: &Category) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE categories SET name = ?3, enabled = ?4, position = ?5
            WHERE restaurant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&category.restaurant_id)
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.enabled)
        .bind(category.position)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }
        Ok(())
    }

    /// Deletes the category and its products. Returns how many products went.
    pub async fn delete_category(&self, restaurant_id: &str, id: &str) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;

        let products: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE restaurant_id = ?1 AND category_id = ?2",
        )
        .bind(restaurant_id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM categories WHERE restaurant_id = ?1 AND id = ?2")
            .bind(restaurant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        tx.commit().await?;

        let removed = products.max(0) as u64;
        info!(restaurant_id, category_id = %id, removed, "Category deleted");
        Ok(removed)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Products by name, optionally within one category.
    pub async fn products(&self, restaurant_id: &str, category_id: Option<&str>) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE restaurant_id = ?1 AND (?2 IS NULL OR category_id = ?2) \
             ORDER BY name"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(restaurant_id)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    pub async fn get_product(&self, restaurant_id: &str, id: &str) -> DbResult<Option<Product>> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE restaurant_id = ?1 AND id = ?2");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(restaurant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a product. The category must belong to the same restaurant.
    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        if self
            .get_category(&product.restaurant_id, &product.category_id)
            .await?
            .is_none()
        {
            return Err(DbError::not_found("Category", &product.category_id));
        }

        sqlx::query(
            r#"
            INSERT INTO products (
                id, restaurant_id, category_id, subcategory, name, price_cents,
                stock, enabled, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.restaurant_id)
        .bind(&product.category_id)
        .bind(&product.subcategory)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.enabled)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        info!(restaurant_id = %product.restaurant_id, product = %product.name, "Product created");
        Ok(())
    }

    pub async fn update_product(&self, product: &Product) -> DbResult<()> {
        if self
            .get_category(&product.restaurant_id, &product.category_id)
            .await?
            .is_none()
        {
            return Err(DbError::not_found("Category", &product.category_id));
        }

        let result = sqlx::query(
            r#"
            UPDATE products
            SET category_id = ?3, subcategory = ?4, name = ?5, price_cents = ?6,
                stock = ?7, enabled = ?8, updated_at = ?9
            WHERE restaurant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&product.restaurant_id)
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.subcategory)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.enabled)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }
        Ok(())
    }

    /// Shows or hides a product on the order screen.
    pub async fn set_product_enabled(&self, restaurant_id: &str, id: &str, enabled: bool) -> DbResult<Product> {
        let result = sqlx::query(
            "UPDATE products SET enabled = ?3, updated_at = ?4 WHERE restaurant_id = ?1 AND id = ?2",
        )
        .bind(restaurant_id)
        .bind(id)
        .bind(enabled)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(restaurant_id, product_id = %id, enabled, "Product toggled");
        self.get_product(restaurant_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    pub async fn delete_product(&self, restaurant_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE restaurant_id = ?1 AND id = ?2")
            .bind(restaurant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::new_id;
    use crate::repository::test_support::{restaurant_db, RID};
    use crate::DbError;
    use mesa_core::{Category, Product};

    fn category(name: &str, position: i64) -> Category {
        Category {
            id: new_id(),
            restaurant_id: RID.to_string(),
            name: name.to_string(),
            enabled: true,
            position,
            created_at: Utc::now(),
        }
    }

    fn product(category_id: &str, name: &str, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: new_id(),
            restaurant_id: RID.to_string(),
            category_id: category_id.to_string(),
            subcategory: None,
            name: name.to_string(),
            price_cents,
            stock: None,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_categories_sorted_by_position() {
        let db = restaurant_db().await;
        let menu = db.menu();
        menu.insert_category(&category("Postres", 2)).await.unwrap();
        menu.insert_category(&category("Parrilla", 1)).await.unwrap();

        let names: Vec<String> = menu.categories(RID).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Parrilla", "Postres"]);
    }

    #[tokio::test]
    async fn test_delete_category_cascades_to_products() {
        let db = restaurant_db().await;
        let menu = db.menu();
        let parrilla = category("Parrilla", 0);
        let postres = category("Postres", 1);
        menu.insert_category(&parrilla).await.unwrap();
        menu.insert_category(&postres).await.unwrap();
        menu.insert_product(&product(&parrilla.id, "Vacío", 1_200_000)).await.unwrap();
        menu.insert_product(&product(&parrilla.id, "Chorizo", 350_000)).await.unwrap();
        menu.insert_product(&product(&postres.id, "Flan", 400_000)).await.unwrap();

        let removed = menu.delete_category(RID, &parrilla.id).await.unwrap();
        assert_eq!(removed, 2);
        assert!(menu.products(RID, Some(&parrilla.id)).await.unwrap().is_empty());
        assert_eq!(menu.products(RID, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_product_requires_own_category() {
        let db = restaurant_db().await;
        let err = db.menu().insert_product(&product("missing", "Vacío", 100)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_toggle_and_update_product() {
        let db = restaurant_db().await;
        let menu = db.menu();
        let parrilla = category("Parrilla", 0);
        menu.insert_category(&parrilla).await.unwrap();
        let mut vacio = product(&parrilla.id, "Vacío", 1_200_000);
        menu.insert_product(&vacio).await.unwrap();

        let hidden = menu.set_product_enabled(RID, &vacio.id, false).await.unwrap();
        assert!(!hidden.enabled);

        vacio.price_cents = 1_300_000;
        vacio.enabled = false;
        menu.update_product(&vacio).await.unwrap();
        let stored = menu.get_product(RID, &vacio.id).await.unwrap().unwrap();
        assert_eq!(stored.price_cents, 1_300_000);

        menu.delete_product(RID, &vacio.id).await.unwrap();
        assert!(menu.get_product(RID, &vacio.id).await.unwrap().is_none());
    }
}
