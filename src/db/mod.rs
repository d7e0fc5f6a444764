pub mod repository;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

use crate::error::AppError;

const MAX_CONNECTIONS: u32 = 5;

pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Applies the migrations embedded from `migrations/`.
pub async fn migrate(db: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(db).await?;
    info!("database migrations applied");
    Ok(())
}
