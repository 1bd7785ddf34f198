//! Shared helpers for the commerce integration tests.

#![allow(dead_code)]

use std::path::Path;

use lapidary_commerce::db::{self, ProductRepository};
use lapidary_commerce::models::Product;
use lapidary_core::ProductId;
use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::SqlitePool;

/// Route engine tracing into the test output; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh in-memory database with the schema applied.
pub async fn memory_pool() -> SqlitePool {
    init_tracing();
    let url = SecretString::from("sqlite::memory:");
    let pool = db::create_pool(&url).await.expect("in-memory pool");
    db::migrate(&pool).await.expect("migrate");
    pool
}

/// File-backed database with the schema applied; survives pool reopening.
pub async fn file_pool(path: &Path) -> SqlitePool {
    init_tracing();
    let url = SecretString::from(format!("sqlite:{}", path.display()));
    let pool = db::create_pool(&url).await.expect("file pool");
    db::migrate(&pool).await.expect("migrate");
    pool
}

/// Build a product with the fields the cart paths care about.
pub fn product(id: &str, price: &str, stock: i32) -> Product {
    Product {
        product_id: ProductId::new(id),
        name: format!("Piece {id}"),
        category: "Rings".to_string(),
        material: "Silver".to_string(),
        price: price.parse::<Decimal>().expect("price literal"),
        stock,
        description: String::new(),
        weight: 2.5,
        has_gemstone: false,
        gemstone_type: None,
    }
}

/// Insert a product into the catalog.
pub async fn seed_product(pool: &SqlitePool, product: &Product) {
    ProductRepository::new(pool)
        .create(product)
        .await
        .expect("seed product");
}

/// Current stock for a product, straight from the store.
pub async fn stock_of(pool: &SqlitePool, id: &str) -> i32 {
    db::StockLedger::new(pool)
        .stock_of(&ProductId::new(id))
        .await
        .expect("stock query")
        .expect("product exists")
}
