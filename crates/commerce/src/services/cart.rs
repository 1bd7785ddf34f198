//! Cart orchestration: resolution, reservation, and the dual-mode split.
//!
//! Every mutation on a durable cart keeps the reservation invariant: stock
//! is decremented the moment an item lands in the cart and restored when it
//! leaves, so the stored count reads as "not yet reserved or sold".
//! Fallback carts never touch the stock ledger.

use lapidary_core::{CartLineId, ProductId, UserId};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::db::{self, CartRepository, ProductRepository, StockLedger};
use crate::error::{CommerceError, Result};
use crate::fallback::FallbackCartStore;
use crate::models::{Cart, CartLine, CartRef, Product};
use crate::session::Session;

/// Orchestrates cart resolution and mutation over both backends.
#[derive(Debug, Clone)]
pub struct CartService {
    pool: SqlitePool,
    fallback: FallbackCartStore,
}

impl CartService {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: SqlitePool, fallback: FallbackCartStore) -> Self {
        Self { pool, fallback }
    }

    /// Resolve the session user's active cart, creating one if needed.
    ///
    /// Durable-store unavailability is never surfaced here: the resolution
    /// degrades to a fallback cart instead. A fallback cart hydrates any
    /// previously persisted lines for the user.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Unauthenticated`] for anonymous sessions.
    pub async fn resolve_or_create(&self, session: &Session) -> Result<Cart> {
        let user_id = session.require_user()?;

        if !db::is_reachable(&self.pool).await {
            warn!(user_id = %user_id, "durable store unreachable, using fallback cart");
            return Ok(self.fallback_cart(user_id).await);
        }

        let carts = CartRepository::new(&self.pool);
        let cart_id = match carts.find_cart_id(user_id).await {
            Ok(Some(cart_id)) => cart_id,
            Ok(None) => match carts.create_cart(user_id).await {
                Ok(cart_id) => {
                    debug!(user_id = %user_id, cart_id = %cart_id, "created cart");
                    cart_id
                }
                Err(e) => {
                    warn!(user_id = %user_id, error = %e,
                        "cart creation failed, degrading to fallback cart");
                    return Ok(self.fallback_cart(user_id).await);
                }
            },
            Err(e) => {
                warn!(user_id = %user_id, error = %e,
                    "cart lookup failed, degrading to fallback cart");
                return Ok(self.fallback_cart(user_id).await);
            }
        };

        let lines = match carts.load_lines(&cart_id).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!(cart_id = %cart_id, error = %e,
                    "cart lines unavailable, degrading to fallback cart");
                return Ok(self.fallback_cart(user_id).await);
            }
        };

        Ok(Cart {
            cart_ref: CartRef::Durable(cart_id),
            user_id: user_id.clone(),
            lines,
        })
    }

    /// Build a fallback cart, hydrating persisted lines if any exist.
    async fn fallback_cart(&self, user_id: &UserId) -> Cart {
        let mut cart = Cart {
            cart_ref: CartRef::Fallback(user_id.clone()),
            user_id: user_id.clone(),
            lines: Vec::new(),
        };

        let catalog = ProductRepository::new(&self.pool);
        match self.fallback.load(user_id, &catalog).await {
            Ok(lines) if !lines.is_empty() => {
                info!(user_id = %user_id, lines = lines.len(), "hydrated fallback cart");
                cart.lines = lines;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "fallback cart hydration failed");
            }
        }

        cart
    }

    /// Add a product to the session user's cart.
    ///
    /// Durable mode re-fetches the product, validates stock and price,
    /// upserts the cart line, and reserves the stock. If the reservation
    /// write fails after the line was written, the line is removed again
    /// and the call fails with [`CommerceError::StockUpdateFailed`].
    ///
    /// Fallback mode only mutates and persists the local line set.
    ///
    /// # Errors
    ///
    /// See [`CommerceError`]; `quantity < 1` is rejected as
    /// `InvalidLineData`.
    pub async fn add_to_cart(
        &self,
        session: &Session,
        product: &Product,
        quantity: i32,
    ) -> Result<()> {
        session.require_user()?;
        if quantity < 1 {
            return Err(CommerceError::InvalidLineData(format!(
                "quantity must be at least 1, got {quantity}"
            )));
        }

        let mut cart = self.resolve_or_create(session).await?;

        match cart.cart_ref.clone() {
            CartRef::Fallback(_) => {
                if let Some(line) = cart
                    .lines
                    .iter_mut()
                    .find(|line| line.product.product_id == product.product_id)
                {
                    line.quantity += quantity;
                } else {
                    let line_id = next_synthetic_line_id(&cart);
                    cart.lines.push(CartLine {
                        line_id,
                        product: product.clone(),
                        quantity,
                    });
                }
                self.fallback.save(&cart)?;
                info!(user_id = %cart.user_id, product_id = %product.product_id,
                    quantity, "added to fallback cart");
                Ok(())
            }
            CartRef::Durable(cart_id) => {
                // Always validate against fresh catalog data, not the
                // caller's snapshot.
                let catalog = ProductRepository::new(&self.pool);
                let fresh = catalog
                    .get_by_id(&product.product_id)
                    .await?
                    .ok_or_else(|| CommerceError::ProductNotFound(product.product_id.clone()))?;

                if fresh.stock < quantity {
                    return Err(CommerceError::InsufficientStock {
                        product_id: fresh.product_id,
                        available: fresh.stock,
                        requested: quantity,
                    });
                }
                if fresh.price <= Decimal::ZERO {
                    return Err(CommerceError::InvalidPrice(fresh.product_id));
                }

                let carts = CartRepository::new(&self.pool);
                match carts.find_line(&cart_id, &fresh.product_id).await? {
                    Some(line_id) => {
                        carts.increment_line(line_id, quantity).await?;
                    }
                    None => {
                        carts.insert_line(&cart_id, &fresh.product_id, quantity).await?;
                    }
                }

                // Reserve the stock. The cart write and this decrement are
                // two separate statements, so a failed decrement compensates
                // by removing the line again.
                let ledger = StockLedger::new(&self.pool);
                let reserved = ledger
                    .set_stock(&fresh.product_id, fresh.stock - quantity)
                    .await;
                if !matches!(reserved, Ok(true)) {
                    if let Err(e) = carts
                        .delete_line_by_product(&cart_id, &fresh.product_id)
                        .await
                    {
                        error!(cart_id = %cart_id, product_id = %fresh.product_id, error = %e,
                            "failed to compensate cart line after stock update failure");
                    }
                    return Err(CommerceError::StockUpdateFailed(fresh.product_id));
                }

                info!(cart_id = %cart_id, product_id = %fresh.product_id, quantity,
                    "added to cart, stock reserved");
                Ok(())
            }
        }
    }

    /// Change a cart line's quantity.
    ///
    /// A new quantity of zero or less behaves as a removal. Otherwise the
    /// difference is applied to the product's stock in durable mode
    /// (positive difference returns stock, negative reserves more).
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::LineNotFound`] if the line is not in the
    /// resolved cart, [`CommerceError::InsufficientStock`] if the increase
    /// cannot be covered.
    pub async fn update_cart_item(
        &self,
        session: &Session,
        line_id: CartLineId,
        new_quantity: i32,
    ) -> Result<()> {
        session.require_user()?;

        if new_quantity <= 0 {
            return self.remove_from_cart(session, line_id).await;
        }

        let mut cart = self.resolve_or_create(session).await?;
        let Some(current) = cart.line(line_id) else {
            return Err(CommerceError::LineNotFound(line_id));
        };
        let product_id = current.product.product_id.clone();
        let current_quantity = current.quantity;

        let catalog = ProductRepository::new(&self.pool);
        let fresh = catalog
            .get_by_id(&product_id)
            .await?
            .ok_or_else(|| CommerceError::ProductNotFound(product_id.clone()))?;

        // Positive change returns stock, negative reserves more.
        let stock_change = current_quantity - new_quantity;
        if fresh.stock + stock_change < 0 {
            return Err(CommerceError::InsufficientStock {
                product_id,
                available: fresh.stock,
                requested: -stock_change,
            });
        }

        match cart.cart_ref.clone() {
            CartRef::Fallback(_) => {
                if let Some(line) = cart.lines.iter_mut().find(|line| line.line_id == line_id) {
                    line.quantity = new_quantity;
                }
                self.fallback.save(&cart)?;
                Ok(())
            }
            CartRef::Durable(cart_id) => {
                let carts = CartRepository::new(&self.pool);
                if !carts.set_line_quantity(line_id, new_quantity).await? {
                    return Err(CommerceError::LineNotFound(line_id));
                }

                let ledger = StockLedger::new(&self.pool);
                match ledger.set_stock(&product_id, fresh.stock + stock_change).await {
                    Ok(true) => {}
                    Ok(false) | Err(_) => {
                        warn!(cart_id = %cart_id, product_id = %product_id, stock_change,
                            "stock adjustment after line update failed");
                    }
                }
                Ok(())
            }
        }
    }

    /// Remove a line from the session user's cart.
    ///
    /// In durable mode the line's quantity is restored to the product's
    /// stock after the deletion; a failed restoration is logged, not
    /// surfaced, since the removal itself already succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::LineNotFound`] if the line is not in the
    /// resolved cart.
    pub async fn remove_from_cart(&self, session: &Session, line_id: CartLineId) -> Result<()> {
        session.require_user()?;

        let mut cart = self.resolve_or_create(session).await?;
        let Some(line) = cart.line(line_id) else {
            return Err(CommerceError::LineNotFound(line_id));
        };
        let product_id = line.product.product_id.clone();
        let quantity = line.quantity;

        match cart.cart_ref.clone() {
            CartRef::Fallback(_) => {
                cart.lines.retain(|line| line.line_id != line_id);
                self.fallback.save(&cart)?;
                Ok(())
            }
            CartRef::Durable(_) => {
                let carts = CartRepository::new(&self.pool);
                if !carts.delete_line(line_id).await? {
                    return Err(CommerceError::LineNotFound(line_id));
                }

                self.restore_stock(&product_id, quantity).await;
                Ok(())
            }
        }
    }

    /// Empty the session user's cart.
    ///
    /// Durable mode restores stock for every line (best-effort per line)
    /// before deleting the lines. Fallback mode discards the line set and
    /// deletes the persisted record entirely.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Persistence`] if the durable deletion
    /// fails.
    pub async fn clear_cart(&self, session: &Session) -> Result<()> {
        session.require_user()?;

        let cart = self.resolve_or_create(session).await?;

        match cart.cart_ref.clone() {
            CartRef::Fallback(_) => {
                if let Err(e) = self.fallback.delete(&cart.user_id) {
                    warn!(user_id = %cart.user_id, error = %e,
                        "failed to delete fallback cart record");
                }
                Ok(())
            }
            CartRef::Durable(cart_id) => {
                for line in &cart.lines {
                    self.restore_stock(&line.product.product_id, line.quantity).await;
                }

                let carts = CartRepository::new(&self.pool);
                carts.clear(&cart_id).await?;
                Ok(())
            }
        }
    }

    /// Return a quantity to a product's stock, logging any failure.
    async fn restore_stock(&self, product_id: &ProductId, quantity: i32) {
        let catalog = ProductRepository::new(&self.pool);
        let ledger = StockLedger::new(&self.pool);

        match catalog.get_by_id(product_id).await {
            Ok(Some(fresh)) => {
                match ledger.set_stock(product_id, fresh.stock + quantity).await {
                    Ok(true) => {}
                    Ok(false) | Err(_) => {
                        warn!(product_id = %product_id, quantity, "stock restoration failed");
                    }
                }
            }
            Ok(None) => {
                debug!(product_id = %product_id, "product gone, nothing to restore");
            }
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "stock restoration lookup failed");
            }
        }
    }
}

/// Next synthetic line id for a fallback cart: one below the lowest in use.
fn next_synthetic_line_id(cart: &Cart) -> CartLineId {
    let lowest = cart
        .lines
        .iter()
        .map(|line| line.line_id.as_i32())
        .filter(|id| *id < 0)
        .min()
        .unwrap_or(0);
    CartLineId::new(lowest - 1)
}

#[cfg(test)]
mod tests {
    use lapidary_core::ProductId;

    use super::*;

    fn fallback_cart_with_lines(ids: &[i32]) -> Cart {
        Cart {
            cart_ref: CartRef::Fallback(UserId::new("CUST-1")),
            user_id: UserId::new("CUST-1"),
            lines: ids
                .iter()
                .map(|id| CartLine {
                    line_id: CartLineId::new(*id),
                    product: Product {
                        product_id: ProductId::new(format!("PROD-{id}")),
                        name: String::new(),
                        category: String::new(),
                        material: String::new(),
                        price: Decimal::ONE,
                        stock: 1,
                        description: String::new(),
                        weight: 0.0,
                        has_gemstone: false,
                        gemstone_type: None,
                    },
                    quantity: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn synthetic_ids_descend_below_existing() {
        let cart = fallback_cart_with_lines(&[]);
        assert_eq!(next_synthetic_line_id(&cart), CartLineId::new(-1));

        let cart = fallback_cart_with_lines(&[-1, -2]);
        assert_eq!(next_synthetic_line_id(&cart), CartLineId::new(-3));
    }
}
