//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  mesa-api startup                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ Concurrent access from HTTP handlers                           │
//! │       ▼                                                                 │
//! │  GET /api/pagos-resumen ──► seven reads in parallel                    │
//! │  POST /api/ordenes/{id}/pagar ──► one write transaction                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases run in WAL mode so readers don't block the writer.
//! In-memory databases live on a single connection and skip WAL.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    EmployeeRepository, InventoryRepository, LedgerRepository, MenuRepository, OrderRepository,
    RegisterRepository, RestaurantRepository, ShiftRepository,
};

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("./data/mesa.db")
///     .max_connections(8)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1, // Every connection would see its own database
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cloning is cheap: the pool is reference counted. Handlers get a clone via
/// the application state and ask it for the repository they need.
///
/// ## Usage in Handlers
/// ```rust,ignore
/// async fn list_orders(
///     State(state): State<AppState>,
///     Tenant(restaurant_id): Tenant,
/// ) -> Result<Json<Vec<Order>>, ApiError> {
///     let orders = state.db.orders().list(&restaurant_id, None, None).await?;
///     Ok(Json(orders))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads (file databases)
    ///    - NORMAL synchronous
    ///    - Foreign keys enabled (category delete cascades to products)
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let in_memory = config.is_in_memory();
        let connect_url = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}?mode=rwc", config.database_path.display())
        };

        let mut connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            // SQLite has foreign keys disabled by default
            .foreign_keys(true)
            .create_if_missing(true);

        if !in_memory {
            connect_options = connect_options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        debug!(in_memory, "Connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout);

        // Dropping the only in-memory connection drops the database with it.
        pool_options = if in_memory {
            pool_options
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            pool_options.idle_timeout(Some(config.idle_timeout))
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// Prefer repository methods when available.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn restaurants(&self) -> RestaurantRepository {
        RestaurantRepository::new(self.pool.clone())
    }

    pub fn employees(&self) -> EmployeeRepository {
        EmployeeRepository::new(self.pool.clone())
    }

    /// Returns the menu repository (categories and products).
    pub fn menu(&self) -> MenuRepository {
        MenuRepository::new(self.pool.clone())
    }

    /// Returns the inventory repository (drinks, raw materials, stock).
    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    /// Returns the order repository (orders and tickets).
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Returns the ledger repository (incomes, expenses, virtual money,
    /// processor transactions).
    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.pool.clone())
    }

    pub fn registers(&self) -> RegisterRepository {
        RegisterRepository::new(self.pool.clone())
    }

    pub fn shifts(&self) -> ShiftRepository {
        ShiftRepository::new(self.pool.clone())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fk: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
