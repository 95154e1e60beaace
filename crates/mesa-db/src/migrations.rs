//! # Database Migrations
//!
//! Embedded SQL migrations for Mesa POS.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::new()                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table (create if missing)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                │
//! │       │                                                                 │
//! │       └── 001_initial_schema.sql                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record each one                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)` for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}
