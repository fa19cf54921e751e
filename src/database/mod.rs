pub mod registrations_repo;
pub mod schema;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Opens the pool for `database_url` and makes sure the registrations table exists.
pub async fn connect(database_url: &str) -> sqlx::Result<SqlitePool> {
    if database_url.contains(":memory:") {
        return connect_in_memory().await;
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    schema::ensure_schema(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory store. Every extra connection would see its own empty database.
pub async fn connect_in_memory() -> sqlx::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    schema::ensure_schema(&pool).await?;
    Ok(pool)
}
