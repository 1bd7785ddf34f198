//! The stock ledger: sole mutator of `products.stock`.
//!
//! Stock adjustments are a read of the current count followed by a write of
//! the new count, performed by the callers (cart service) around this
//! ledger. The write itself is a plain UPDATE; concurrent adjustments rely
//! on the store's row-level locking and can lose updates under contention.

use lapidary_core::ProductId;
use sqlx::SqlitePool;

use super::RepositoryError;

/// Read and write access to the authoritative stock count.
pub struct StockLedger<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StockLedger<'a> {
    /// Create a new stock ledger over the durable store.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Current stock count for a product, if it exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stock_of(&self, product_id: &ProductId) -> Result<Option<i32>, RepositoryError> {
        let stock = sqlx::query_scalar::<_, i32>(
            "SELECT stock FROM products WHERE product_id = ?1",
        )
        .bind(product_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(stock)
    }

    /// Overwrite the stock count for a product.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was updated, `false` if the product does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_stock(
        &self,
        product_id: &ProductId,
        new_stock: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE products SET stock = ?1 WHERE product_id = ?2")
            .bind(new_stock)
            .bind(product_id.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
