//! # Employee Repository
//!
//! Back-office users. Emails are unique per restaurant and stored lowercased.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::DbResult;
use mesa_core::Employee;

const EMPLOYEE_COLUMNS: &str = "id, restaurant_id, name, email, password_hash, role, created_at";

/// Repository for employees.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    pub async fn insert(&self, employee: &Employee) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_employee(&mut conn, employee).await?;

        info!(
            restaurant_id = %employee.restaurant_id,
            employee_id = %employee.id,
            role = ?employee.role,
            "Employee created"
        );
        Ok(())
    }

    /// Looks up a login. The email comparison ignores case.
    pub async fn find_by_email(&self, restaurant_id: &str, email: &str) -> DbResult<Option<Employee>> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE restaurant_id = ?1 AND email = ?2"
        );

        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(restaurant_id)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    pub async fn get(&self, restaurant_id: &str, id: &str) -> DbResult<Option<Employee>> {
        let sql =
            format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE restaurant_id = ?1 AND id = ?2");

        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(restaurant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    pub async fn list(&self, restaurant_id: &str) -> DbResult<Vec<Employee>> {
        let sql =
            format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE restaurant_id = ?1 ORDER BY name");

        let employees = sqlx::query_as::<_, Employee>(&sql)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(employees)
    }
}

pub(crate) async fn insert_employee(conn: &mut SqliteConnection, employee: &Employee) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO employees (id, restaurant_id, name, email, password_hash, role, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&employee.id)
    .bind(&employee.restaurant_id)
    .bind(&employee.name)
    .bind(employee.email.trim().to_lowercase())
    .bind(&employee.password_hash)
    .bind(employee.role)
    .bind(employee.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{admin, restaurant_db, RID};
    use mesa_core::Role;

    #[tokio::test]
    async fn test_email_lookup_ignores_case() {
        let db = restaurant_db().await;
        let mut mozo = admin(RID, "Mozo@Parrilla.com");
        mozo.role = Role::Mozo;
        db.employees().insert(&mozo).await.unwrap();

        let found = db.employees().find_by_email(RID, "MOZO@parrilla.com").await.unwrap().unwrap();
        assert_eq!(found.role, Role::Mozo);
        assert!(db.employees().get(RID, &found.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_within_restaurant() {
        let db = restaurant_db().await;
        let err = db.employees().insert(&admin(RID, "admin@parrilla.com")).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(db.employees().list(RID).await.unwrap().len(), 1);
    }
}
