//! Database operations for orders and order lines.
//!
//! Writes happen inside the checkout transaction and therefore run against
//! a borrowed connection rather than the pool; reads run against the pool
//! directly.

use chrono::{DateTime, Utc};
use lapidary_core::{CartLineId, OrderId, OrderStatus, ProductId, UserId};
use sqlx::{SqliteConnection, SqlitePool};

use super::RepositoryError;
use super::products::parse_price;
use crate::models::{CheckoutInput, Order, OrderLine, Product, ProductLookup};

/// Internal row type for order-header queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: String,
    user_id: String,
    order_date: DateTime<Utc>,
    total_amount: String,
    status: String,
    payment_method: String,
    shipping_address: String,
    notes: String,
}

/// Internal row type for order lines left-joined against products.
///
/// The product columns are nullable: the catalog row may have been retired
/// since the order was placed.
#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    product_id: String,
    quantity: i32,
    unit_price: String,
    name: Option<String>,
    category: Option<String>,
    material: Option<String>,
    price: Option<String>,
    stock: Option<i32>,
    description: Option<String>,
    weight: Option<f64>,
    has_gemstone: Option<bool>,
    gemstone_type: Option<String>,
}

impl OrderLineRow {
    fn into_order_line(self) -> Result<OrderLine, RepositoryError> {
        let unit_price = parse_price(&self.unit_price, &self.product_id)?;

        let lookup = if let (Some(name), Some(price)) = (self.name, self.price.as_deref()) {
            ProductLookup::Found(Product {
                product_id: ProductId::new(self.product_id.clone()),
                name,
                category: self.category.unwrap_or_default(),
                material: self.material.unwrap_or_default(),
                price: parse_price(price, &self.product_id)?,
                stock: self.stock.unwrap_or(0),
                description: self.description.unwrap_or_default(),
                weight: self.weight.unwrap_or(0.0),
                has_gemstone: self.has_gemstone.unwrap_or(false),
                gemstone_type: self.gemstone_type,
            })
        } else if self.product_id.trim().is_empty() {
            ProductLookup::Missing
        } else {
            // Catalog row is gone; rebuild a placeholder from the line data.
            ProductLookup::Reconstructed(Product {
                product_id: ProductId::new(self.product_id.clone()),
                name: format!("Unknown Product ({})", self.product_id),
                category: "Unknown".to_string(),
                material: "Unknown".to_string(),
                price: unit_price,
                stock: 0,
                description: String::new(),
                weight: 0.0,
                has_gemstone: false,
                gemstone_type: None,
            })
        };

        Ok(OrderLine {
            product_id: ProductId::new(self.product_id),
            product: lookup,
            quantity: self.quantity,
            unit_price,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List a user's orders, newest first, each with its lines loaded.
    ///
    /// Statuses are the stored values; the caller merges the overlay.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` on malformed stored
    /// amounts.
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT order_id, user_id, order_date, total_amount, status,
                   payment_method, shipping_address, notes
            FROM orders
            WHERE user_id = ?1
            ORDER BY order_date DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.lines_for_order(&row.order_id).await?;
            let total_amount = row.total_amount.parse().map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid total for order {}: {e}",
                    row.order_id
                ))
            })?;

            orders.push(Order {
                order_id: OrderId::new(row.order_id),
                user_id: UserId::new(row.user_id),
                status: row.status,
                payment_method: row.payment_method,
                shipping_address: row.shipping_address,
                notes: row.notes,
                total_amount,
                order_date: row.order_date,
                lines,
            });
        }

        Ok(orders)
    }

    async fn lines_for_order(&self, order_id: &str) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT oi.product_id, oi.quantity, oi.unit_price,
                   p.name, p.category, p.material, p.price, p.stock,
                   p.description, p.weight, p.has_gemstone, p.gemstone_type
            FROM order_items oi
            LEFT JOIN products p ON oi.product_id = p.product_id
            WHERE oi.order_id = ?1
            ORDER BY oi.order_item_id ASC
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderLineRow::into_order_line).collect()
    }

    /// Number of orders a user has placed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_count(&self, user_id: &UserId) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = ?1")
                .bind(user_id.as_str())
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// Total units a user has purchased across all orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_purchased(&self, user_id: &UserId) -> Result<i64, RepositoryError> {
        let total = sqlx::query_scalar::<_, Option<i64>>(
            r"
            SELECT SUM(oi.quantity)
            FROM order_items oi
            JOIN orders o ON oi.order_id = o.order_id
            WHERE o.user_id = ?1
            ",
        )
        .bind(user_id.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    // =========================================================================
    // Transaction-scoped writes (checkout)
    // =========================================================================

    /// Insert the order header row with status `PENDING`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails or affects no
    /// rows.
    pub async fn insert_order_header(
        conn: &mut SqliteConnection,
        order_id: &OrderId,
        user_id: &UserId,
        input: &CheckoutInput,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO orders (
                order_id, user_id, order_date, total_amount, status,
                payment_method, shipping_address, notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(order_id.as_str())
        .bind(user_id.as_str())
        .bind(Utc::now())
        .bind(input.total_amount.to_string())
        .bind(OrderStatus::Pending.to_string())
        .bind(&input.payment_method)
        .bind(&input.shipping_address)
        .bind(input.notes.as_deref().unwrap_or(""))
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "failed to create order {order_id}"
            )));
        }

        Ok(())
    }

    /// Insert one order line, capturing quantity and unit price as of now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_order_line(
        conn: &mut SqliteConnection,
        order_id: &OrderId,
        product_id: &ProductId,
        quantity: i32,
        unit_price: rust_decimal::Decimal,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(order_id.as_str())
        .bind(product_id.as_str())
        .bind(quantity)
        .bind(unit_price.to_string())
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Delete a consumed cart line inside the checkout transaction.
    ///
    /// # Returns
    ///
    /// Returns the number of deleted rows; zero means the line was already
    /// gone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_cart_line(
        conn: &mut SqliteConnection,
        line_id: CartLineId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_item_id = ?1")
            .bind(line_id.as_i32())
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}
