//! Atomic conversion of selected cart lines into an order.
//!
//! The whole checkout runs inside one database transaction: the order
//! header, its lines, and the deletion of the consumed cart lines either
//! all land or none do. Stock is deliberately untouched here; it was
//! reserved when the items entered the cart, and decrementing again would
//! double-count.

use lapidary_core::OrderId;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{CommerceError, Result};
use crate::models::{Cart, CartLine, CheckoutInput};
use crate::session::Session;

/// Executes checkouts and retains the most recent failure detail.
#[derive(Debug)]
pub struct CheckoutService {
    pool: SqlitePool,
    last_error: Option<String>,
}

impl CheckoutService {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            last_error: None,
        }
    }

    /// Detail of the most recent failed checkout, if the last call failed.
    ///
    /// Cleared again by the next successful call.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Create an order from a caller-selected subset of a cart's lines.
    ///
    /// Only valid against a durable cart. Unselected lines are never
    /// touched; a cart may be partially checked out, leaving the remainder
    /// as a normal cart. On any failure the transaction rolls back
    /// entirely: no order, no order lines, no cart-line deletions persist.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::UnsupportedOnFallbackCart`] for fallback
    /// carts, [`CommerceError::EmptySelection`] for an empty selection,
    /// [`CommerceError::InvalidLineData`] if a selected line cannot form a
    /// valid order line, and [`CommerceError::Persistence`] for store
    /// failures.
    pub async fn create_order_from_selected(
        &mut self,
        session: &Session,
        cart: &Cart,
        selected: &[CartLine],
        input: &CheckoutInput,
    ) -> Result<OrderId> {
        let result = self.checkout(session, cart, selected, input).await;

        match &result {
            Ok(order_id) => {
                info!(order_id = %order_id, lines = selected.len(), "order created");
                self.last_error = None;
            }
            Err(e) => {
                warn!(error = %e, "checkout failed, transaction rolled back");
                self.last_error = Some(e.to_string());
            }
        }

        result
    }

    async fn checkout(
        &self,
        session: &Session,
        cart: &Cart,
        selected: &[CartLine],
        input: &CheckoutInput,
    ) -> Result<OrderId> {
        let user_id = session.require_user()?;

        if cart.cart_ref.is_fallback() {
            return Err(CommerceError::UnsupportedOnFallbackCart);
        }
        if selected.is_empty() {
            return Err(CommerceError::EmptySelection);
        }

        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let order_id = OrderId::new(format!("ORD-{}", Uuid::new_v4()));
        OrderRepository::insert_order_header(&mut tx, &order_id, user_id, input).await?;

        for line in selected {
            validate_line(line)?;
            OrderRepository::insert_order_line(
                &mut tx,
                &order_id,
                &line.product.product_id,
                line.quantity,
                line.product.price,
            )
            .await?;
            // Stock stays as-is: it was reserved when the line entered the
            // cart.
        }

        // The order is about to commit; a leftover cart row is harmless and
        // must not lose it.
        for line in selected {
            let deleted = OrderRepository::delete_cart_line(&mut tx, line.line_id).await?;
            if deleted == 0 {
                warn!(line_id = %line.line_id, "cart line already gone during checkout");
            }
        }

        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(order_id)
    }
}

/// Reject lines that cannot form a valid order line.
fn validate_line(line: &CartLine) -> Result<()> {
    if line.product.product_id.as_str().trim().is_empty() {
        return Err(CommerceError::InvalidLineData(format!(
            "empty product id for line {}",
            line.line_id
        )));
    }
    if line.quantity <= 0 {
        return Err(CommerceError::InvalidLineData(format!(
            "non-positive quantity {} for product {}",
            line.quantity, line.product.product_id
        )));
    }
    if line.product.price <= Decimal::ZERO {
        return Err(CommerceError::InvalidLineData(format!(
            "non-positive unit price for product {}",
            line.product.product_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use lapidary_core::{CartLineId, ProductId};

    use crate::models::Product;

    use super::*;

    fn line(quantity: i32, price: Decimal) -> CartLine {
        CartLine {
            line_id: CartLineId::new(1),
            product: Product {
                product_id: ProductId::new("PROD-1"),
                name: "Ring".to_string(),
                category: "Rings".to_string(),
                material: "Gold".to_string(),
                price,
                stock: 5,
                description: String::new(),
                weight: 1.0,
                has_gemstone: false,
                gemstone_type: None,
            },
            quantity,
        }
    }

    #[test]
    fn validate_line_accepts_sane_lines() {
        assert!(validate_line(&line(2, Decimal::new(500, 2))).is_ok());
    }

    #[test]
    fn validate_line_rejects_bad_quantity_and_price() {
        assert!(matches!(
            validate_line(&line(0, Decimal::ONE)),
            Err(CommerceError::InvalidLineData(_))
        ));
        assert!(matches!(
            validate_line(&line(1, Decimal::ZERO)),
            Err(CommerceError::InvalidLineData(_))
        ));
    }

    #[test]
    fn validate_line_rejects_blank_product_id() {
        let mut bad = line(1, Decimal::ONE);
        bad.product.product_id = ProductId::new("  ");
        assert!(matches!(
            validate_line(&bad),
            Err(CommerceError::InvalidLineData(_))
        ));
    }
}
