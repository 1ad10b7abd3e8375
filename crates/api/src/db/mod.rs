//! Database operations for the cart service.
//!
//! # Database: `axle_cart`
//!
//! One table, `cart_items`: one row per (user, product) with the
//! denormalized product snapshot captured at add-time. The unique key on
//! `(user_id, product_id)` is what makes add-or-increment a single upsert.
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/` and are applied on startup
//! via [`MIGRATOR`]; the service owns its schema.

pub mod cart;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use thiserror::Error;

/// Embedded migrations, applied at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create a MySQL connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
