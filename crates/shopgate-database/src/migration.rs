//! Embedded database migrations.

use sqlx::PgPool;

use shopgate_core::error::{AppError, ErrorKind};
use shopgate_core::result::AppResult;

/// Run all pending migrations.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Migration failed", e))
}
