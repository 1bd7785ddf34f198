//! Database operations for catalog products.
//!
//! The catalog itself (browsing, search, admin edits) lives outside this
//! engine; this repository covers the reads the cart and order paths need,
//! plus row creation for seeding.

use lapidary_core::ProductId;
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use super::RepositoryError;
use crate::models::Product;

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub(crate) product_id: String,
    pub(crate) name: String,
    pub(crate) category: String,
    pub(crate) material: String,
    pub(crate) price: String,
    pub(crate) stock: i32,
    pub(crate) description: String,
    pub(crate) weight: f64,
    pub(crate) has_gemstone: bool,
    pub(crate) gemstone_type: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = parse_price(&row.price, &row.product_id)?;
        Ok(Self {
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
        })
    }
}

/// Parse a stored decimal price, flagging malformed data.
pub(crate) fn parse_price(raw: &str, product_id: &str) -> Result<Decimal, RepositoryError> {
    raw.parse::<Decimal>().map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid price for product {product_id}: {e}"))
    })
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product id already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO products (
                product_id, name, category, material, price, stock,
                description, weight, has_gemstone, gemstone_type
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(product.product_id.as_str())
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.material)
        .bind(product.price.to_string())
        .bind(product.stock)
        .bind(&product.description)
        .bind(product.weight)
        .bind(product.has_gemstone)
        .bind(&product.gemstone_type)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "product {} already exists",
                    product.product_id
                ));
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored price is
    /// malformed.
    pub async fn get_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT product_id, name, category, material, price, stock,
                   description, weight, has_gemstone, gemstone_type
            FROM products
            WHERE product_id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Whether a product exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE product_id = ?1",
        )
        .bind(id.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }
}
