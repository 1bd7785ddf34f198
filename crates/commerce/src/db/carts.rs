//! Database operations for durable carts and their lines.
//!
//! This is the durable half of the dual-mode cart store. The fallback half
//! lives in [`crate::fallback`] and is file-backed; resolution between the
//! two happens in the cart service.

use lapidary_core::{CartId, CartLineId, ProductId, UserId};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::RepositoryError;
use super::products::parse_price;
use crate::models::{CartLine, Product};

/// Internal row type for cart-line queries joined against products.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    cart_item_id: i32,
    quantity: i32,
    product_id: String,
    name: String,
    category: String,
    material: String,
    price: String,
    stock: i32,
    description: String,
    weight: f64,
    has_gemstone: bool,
    gemstone_type: Option<String>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let price = parse_price(&row.price, &row.product_id)?;
        Ok(Self {
            line_id: CartLineId::new(row.cart_item_id),
            product: Product {
                product_id: ProductId::new(row.product_id),
                name: row.name,
                category: row.category,
                material: row.material,
                price,
                stock: row.stock,
                description: row.description,
                weight: row.weight,
                has_gemstone: row.has_gemstone,
                gemstone_type: row.gemstone_type,
            },
            quantity: row.quantity,
        })
    }
}

/// Repository for durable-cart database operations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the active cart for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_cart_id(&self, user_id: &UserId) -> Result<Option<CartId>, RepositoryError> {
        let cart_id = sqlx::query_scalar::<_, String>(
            "SELECT cart_id FROM shopping_carts WHERE user_id = ?1",
        )
        .bind(user_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(cart_id.map(CartId::new))
    }

    /// Create a new cart for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a cart.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_cart(&self, user_id: &UserId) -> Result<CartId, RepositoryError> {
        let cart_id = CartId::new(format!("CART-{}", Uuid::new_v4()));

        sqlx::query("INSERT INTO shopping_carts (cart_id, user_id) VALUES (?1, ?2)")
            .bind(cart_id.as_str())
            .bind(user_id.as_str())
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict(format!(
                        "user {user_id} already has a cart"
                    ));
                }
                RepositoryError::Database(e)
            })?;

        Ok(cart_id)
    }

    /// Load all lines of a cart, newest first, with product snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` on malformed stored prices.
    pub async fn load_lines(&self, cart_id: &CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.cart_item_id, ci.quantity,
                   p.product_id, p.name, p.category, p.material, p.price,
                   p.stock, p.description, p.weight, p.has_gemstone,
                   p.gemstone_type
            FROM cart_items ci
            JOIN products p ON ci.product_id = p.product_id
            WHERE ci.cart_id = ?1
            ORDER BY ci.cart_item_id DESC
            ",
        )
        .bind(cart_id.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    /// Find the line holding a given product within a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_line(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<Option<CartLineId>, RepositoryError> {
        let line_id = sqlx::query_scalar::<_, i32>(
            "SELECT cart_item_id FROM cart_items WHERE cart_id = ?1 AND product_id = ?2",
        )
        .bind(cart_id.as_str())
        .bind(product_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(line_id.map(CartLineId::new))
    }

    /// Insert a new cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_line(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        quantity: i32,
    ) -> Result<CartLineId, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES (?1, ?2, ?3)",
        )
        .bind(cart_id.as_str())
        .bind(product_id.as_str())
        .bind(quantity)
        .execute(self.pool)
        .await?;

        let line_id = i32::try_from(result.last_insert_rowid()).map_err(|_| {
            RepositoryError::DataCorruption("cart line id outside i32 range".to_string())
        })?;

        Ok(CartLineId::new(line_id))
    }

    /// Add to an existing line's quantity.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn increment_line(
        &self,
        line_id: CartLineId,
        additional_quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = quantity + ?1 WHERE cart_item_id = ?2",
        )
        .bind(additional_quantity)
        .bind(line_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite a line's quantity.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_line_quantity(
        &self,
        line_id: CartLineId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE cart_items SET quantity = ?1 WHERE cart_item_id = ?2")
            .bind(quantity)
            .bind(line_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a line by id.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_line(&self, line_id: CartLineId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_item_id = ?1")
            .bind(line_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete the line holding a given product.
    ///
    /// Used to compensate a cart write whose follow-up stock decrement
    /// failed.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_line_by_product(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1 AND product_id = ?2")
            .bind(cart_id.as_str())
            .bind(product_id.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every line in a cart.
    ///
    /// # Returns
    ///
    /// Returns the number of deleted lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, cart_id: &CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
