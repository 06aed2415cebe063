use log::info;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

pub type Database = Pool<Postgres>;

pub async fn create_database_pool(database_url: &str) -> Result<Database, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await?;

    info!("Connected to database successfully");
    Ok(pool)
}

/// Creates the vendors/products/transactions tables if they are missing.
pub async fn run_migrations(pool: &Database) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}

/// Schema shown on the help screen for stores that provision tables by hand.
pub const SCHEMA_SQL: &str = include_str!("../migrations/20240101000000_initial_schema.sql");
