//! Database Module
//!
//! PostgreSQL connection pool, migrations and write-error classification.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseSettings;
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// SQLSTATE raised when a serializable transaction cannot be committed
const SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE raised when Postgres breaks a lock cycle
const DEADLOCK_DETECTED: &str = "40P01";

/// Create a PostgreSQL connection pool
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout))
        .connect(&settings.url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Classify an error from a write path.
///
/// Unique violations, serialization failures and deadlocks are the result of
/// a concurrent writer and become `AppError::Conflict`; everything else stays
/// a database error.
pub fn map_write_error(err: sqlx::Error, table: &'static str) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        let concurrent = db.is_unique_violation()
            || matches!(
                db.code().as_deref(),
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
            );
        if concurrent {
            metrics::record_store_conflict(table);
            tracing::debug!(table, error = %db, "Concurrent modification detected");
            return AppError::Conflict(format!("concurrent modification on {table}"));
        }
    }
    AppError::Database(err)
}
