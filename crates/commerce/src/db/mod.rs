//! Database operations for the commerce `SQLite` store.
//!
//! ## Tables
//!
//! - `products` - Catalog rows; `stock` is the authoritative availability
//!   count
//! - `shopping_carts` - One active cart per user
//! - `cart_items` - Cart lines, one row per (cart, product)
//! - `orders` - Order headers
//! - `order_items` - Order lines with the unit price captured at checkout
//!
//! Schema setup runs through [`migrate`], which is idempotent.

pub mod carts;
pub mod orders;
pub mod products;
pub mod stock;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use thiserror::Error;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use stock::StockLedger;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate cart for a user).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Schema DDL, applied idempotently by [`migrate`].
///
/// `order_items.product_id` deliberately carries no foreign key: orders
/// outlive retired products, and the read path reconstructs a placeholder
/// when the join comes back empty.
const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS products (
    product_id     TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    category       TEXT NOT NULL,
    material       TEXT NOT NULL,
    price          TEXT NOT NULL,
    stock          INTEGER NOT NULL,
    description    TEXT NOT NULL DEFAULT '',
    weight         REAL NOT NULL DEFAULT 0,
    has_gemstone   INTEGER NOT NULL DEFAULT 0,
    gemstone_type  TEXT
);

CREATE TABLE IF NOT EXISTS shopping_carts (
    cart_id  TEXT PRIMARY KEY,
    user_id  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS cart_items (
    cart_item_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    cart_id       TEXT NOT NULL REFERENCES shopping_carts(cart_id) ON DELETE CASCADE,
    product_id    TEXT NOT NULL REFERENCES products(product_id),
    quantity      INTEGER NOT NULL CHECK (quantity >= 1),
    UNIQUE (cart_id, product_id)
);

CREATE TABLE IF NOT EXISTS orders (
    order_id          TEXT PRIMARY KEY,
    user_id           TEXT NOT NULL,
    order_date        TEXT NOT NULL,
    total_amount      TEXT NOT NULL,
    status            TEXT NOT NULL,
    payment_method    TEXT NOT NULL,
    shipping_address  TEXT NOT NULL,
    notes             TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS order_items (
    order_item_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id       TEXT NOT NULL REFERENCES orders(order_id) ON DELETE CASCADE,
    product_id     TEXT NOT NULL,
    quantity       INTEGER NOT NULL,
    unit_price     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cart_items_cart ON cart_items(cart_id);
CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id);
CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id);
";

/// Create a `SQLite` connection pool with sensible defaults.
///
/// SQLite permits limited write concurrency; a single pooled connection
/// avoids persistent "database is locked" failures and keeps in-memory
/// databases alive across queries.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await
}

/// Apply the schema to a freshly created or existing database.
///
/// # Errors
///
/// Returns `sqlx::Error` if any DDL statement fails.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

/// Trivial liveness probe against the durable store.
///
/// Used once per cart resolution to decide between the durable and
/// fallback backends.
pub async fn is_reachable(pool: &SqlitePool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
