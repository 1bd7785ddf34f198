//! Unified error handling for the commerce engine.
//!
//! Repository-level failures live in [`crate::db::RepositoryError`]; this
//! module defines the service-level taxonomy callers match on. All cart,
//! checkout, and order operations return [`Result`].

use lapidary_core::{CartLineId, ProductId};
use thiserror::Error;

use crate::db::RepositoryError;

/// Service-level error type for cart, checkout, and order operations.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// No authenticated user was supplied with the call.
    #[error("no authenticated user")]
    Unauthenticated,

    /// The referenced product does not exist in the catalog.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Not enough stock to satisfy the requested quantity.
    #[error("insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: i32,
        requested: i32,
    },

    /// The product's price is zero or negative and cannot be sold.
    #[error("invalid price for product {0}")]
    InvalidPrice(ProductId),

    /// The stock decrement after a cart write failed; the cart write was
    /// compensated.
    #[error("stock update failed for product {0}")]
    StockUpdateFailed(ProductId),

    /// A cart line carried data that cannot form a valid order line.
    #[error("invalid line data: {0}")]
    InvalidLineData(String),

    /// Checkout was requested with no lines selected.
    #[error("no items selected for checkout")]
    EmptySelection,

    /// The operation requires a durable cart.
    #[error("operation not supported on a fallback cart")]
    UnsupportedOnFallbackCart,

    /// The referenced cart line does not exist in the resolved cart.
    #[error("cart line not found: {0}")]
    LineNotFound(CartLineId),

    /// The durable store rejected or failed a query.
    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),

    /// A fallback-cart or overlay file could not be read or written.
    #[error("local storage failure: {0}")]
    LocalIo(#[from] std::io::Error),
}

/// Result type alias for `CommerceError`.
pub type Result<T> = std::result::Result<T, CommerceError>;
