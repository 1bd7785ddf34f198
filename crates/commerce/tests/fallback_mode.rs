//! Degraded-mode behavior: fallback carts, hydration, and stock isolation.

mod common;

use std::fs;

use lapidary_commerce::models::CartRef;
use lapidary_commerce::{Commerce, Session};
use tempfile::TempDir;

use common::{file_pool, product, seed_product, stock_of};

/// Make cart resolution impossible while leaving the catalog intact.
///
/// The store still answers the liveness probe, so resolution reaches the
/// cart lookup, fails there, and degrades to a fallback cart.
async fn break_cart_tables(pool: &sqlx::SqlitePool) {
    sqlx::raw_sql("DROP TABLE cart_items; DROP TABLE shopping_carts;")
        .execute(pool)
        .await
        .expect("drop cart tables");
}

#[tokio::test]
async fn unreachable_store_degrades_to_fallback_without_touching_stock() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("shop.db");

    let pool = file_pool(&db_path).await;
    let p = product("PROD-1", "5.00", 10);
    seed_product(&pool, &p).await;

    let engine = Commerce::new(pool.clone(), dir.path());
    let session = Session::authenticated("CUST-1");

    // Simulate an outage.
    pool.close().await;

    let cart = engine.cart.resolve_or_create(&session).await.expect("resolve");
    assert!(matches!(cart.cart_ref, CartRef::Fallback(_)));

    engine.cart.add_to_cart(&session, &p, 2).await.expect("fallback add");
    assert!(dir.path().join("local-carts").join("CUST-1.cart").exists());

    // The store comes back: no stock was ever reserved by the fallback cart.
    let pool = file_pool(&db_path).await;
    assert_eq!(stock_of(&pool, "PROD-1").await, 10);
}

#[tokio::test]
async fn failed_cart_creation_degrades_and_hydrates_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("shop.db");

    let pool = file_pool(&db_path).await;
    let a = product("PROD-A", "5.00", 10);
    let b = product("PROD-B", "20.00", 5);
    seed_product(&pool, &a).await;
    seed_product(&pool, &b).await;
    break_cart_tables(&pool).await;

    let engine = Commerce::new(pool.clone(), dir.path());
    let session = Session::authenticated("CUST-1");

    let cart = engine.cart.resolve_or_create(&session).await.expect("resolve");
    assert!(matches!(cart.cart_ref, CartRef::Fallback(_)));

    engine.cart.add_to_cart(&session, &a, 2).await.expect("add a");

    // A later resolution hydrates the persisted lines and merges repeats.
    engine.cart.add_to_cart(&session, &a, 3).await.expect("add a again");
    engine.cart.add_to_cart(&session, &b, 1).await.expect("add b");

    let cart = engine.cart.resolve_or_create(&session).await.expect("resolve");
    assert!(matches!(cart.cart_ref, CartRef::Fallback(_)));
    assert_eq!(cart.lines.len(), 2);
    let line_a = cart
        .lines
        .iter()
        .find(|l| l.product.product_id.as_str() == "PROD-A")
        .expect("hydrated line for A");
    assert_eq!(line_a.quantity, 5);
    assert!(line_a.line_id.is_synthetic());

    // Stock never moves for fallback carts.
    assert_eq!(stock_of(&pool, "PROD-A").await, 10);
    assert_eq!(stock_of(&pool, "PROD-B").await, 5);
}

#[tokio::test]
async fn fallback_update_remove_and_clear_stay_local() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("shop.db");

    let pool = file_pool(&db_path).await;
    let a = product("PROD-A", "5.00", 10);
    let b = product("PROD-B", "20.00", 5);
    seed_product(&pool, &a).await;
    seed_product(&pool, &b).await;
    break_cart_tables(&pool).await;

    let engine = Commerce::new(pool.clone(), dir.path());
    let session = Session::authenticated("CUST-1");

    engine.cart.add_to_cart(&session, &a, 2).await.expect("add a");
    engine.cart.add_to_cart(&session, &b, 1).await.expect("add b");

    let cart = engine.cart.resolve_or_create(&session).await.expect("resolve");
    let line_b = cart
        .lines
        .iter()
        .find(|l| l.product.product_id.as_str() == "PROD-B")
        .expect("line for B");
    engine
        .cart
        .update_cart_item(&session, line_b.line_id, 4)
        .await
        .expect("update b");

    let line_a = cart
        .lines
        .iter()
        .find(|l| l.product.product_id.as_str() == "PROD-A")
        .expect("line for A");
    engine
        .cart
        .remove_from_cart(&session, line_a.line_id)
        .await
        .expect("remove a");

    let cart = engine.cart.resolve_or_create(&session).await.expect("resolve");
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].product.product_id.as_str(), "PROD-B");
    assert_eq!(cart.lines[0].quantity, 4);

    assert_eq!(stock_of(&pool, "PROD-A").await, 10);
    assert_eq!(stock_of(&pool, "PROD-B").await, 5);

    // Clearing discards the persisted record entirely.
    engine.cart.clear_cart(&session).await.expect("clear");
    assert!(!dir.path().join("local-carts").join("CUST-1.cart").exists());
    let cart = engine.cart.resolve_or_create(&session).await.expect("resolve");
    assert!(cart.is_empty());
}

#[tokio::test]
async fn hydration_skips_garbage_and_vanished_products() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("shop.db");

    let pool = file_pool(&db_path).await;
    let a = product("PROD-A", "5.00", 10);
    seed_product(&pool, &a).await;
    break_cart_tables(&pool).await;

    let cart_dir = dir.path().join("local-carts");
    fs::create_dir_all(&cart_dir).expect("cart dir");
    fs::write(
        cart_dir.join("CUST-1.cart"),
        "this is not a record\n-1,PROD-GONE,2\n-2,PROD-A,3\n",
    )
    .expect("write fallback file");

    let engine = Commerce::new(pool.clone(), dir.path());
    let session = Session::authenticated("CUST-1");

    let cart = engine.cart.resolve_or_create(&session).await.expect("resolve");
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].product.product_id.as_str(), "PROD-A");
    assert_eq!(cart.lines[0].quantity, 3);
}
