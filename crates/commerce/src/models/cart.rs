//! Shopping cart domain models.

use lapidary_core::{CartId, CartLineId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::Product;

/// Cart identity, tagged with its persistence mode.
///
/// The mode is fixed for the lifetime of the cart record: a fallback cart
/// never silently upgrades to a durable one. All mode dispatch happens by
/// matching on this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartRef {
    /// Cart persisted as rows in the durable store.
    Durable(CartId),
    /// Cart persisted only in a local per-user file.
    Fallback(UserId),
}

impl CartRef {
    /// Whether this cart lives in the local fallback store.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// One line of a cart: a product and a positive quantity.
///
/// Durable lines carry store-assigned ids; fallback lines carry synthetic
/// negative ids. The product is a snapshot taken at read time, never a
/// frozen copy: price and stock are re-fetched before any mutation that
/// depends on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Line ID, unique within the owning backend.
    pub line_id: CartLineId,
    /// Product snapshot as of the last cart read.
    pub product: Product,
    /// Quantity, always >= 1. A line dropping to zero is deleted instead.
    pub quantity: i32,
}

/// A user's shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Cart identity and persistence mode.
    pub cart_ref: CartRef,
    /// Owning user. At most one active cart exists per user.
    pub user_id: UserId,
    /// Line items, newest first.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_items(&self) -> i32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Total price across all lines at the snapshotted unit prices.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.lines
            .iter()
            .map(|line| line.product.price * Decimal::from(line.quantity))
            .sum()
    }

    /// Find a line by its id.
    #[must_use]
    pub fn line(&self, line_id: CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.line_id == line_id)
    }
}

#[cfg(test)]
mod tests {
    use lapidary_core::ProductId;

    use super::*;

    fn product(id: &str, price: Decimal) -> Product {
        Product {
            product_id: ProductId::new(id),
            name: format!("Piece {id}"),
            category: "Rings".to_string(),
            material: "Silver".to_string(),
            price,
            stock: 10,
            description: String::new(),
            weight: 1.0,
            has_gemstone: false,
            gemstone_type: None,
        }
    }

    #[test]
    fn totals_sum_over_lines() {
        let cart = Cart {
            cart_ref: CartRef::Fallback(UserId::new("CUST-1")),
            user_id: UserId::new("CUST-1"),
            lines: vec![
                CartLine {
                    line_id: CartLineId::new(-1),
                    product: product("PROD-A", Decimal::new(500, 2)),
                    quantity: 2,
                },
                CartLine {
                    line_id: CartLineId::new(-2),
                    product: product("PROD-B", Decimal::new(2000, 2)),
                    quantity: 1,
                },
            ],
        };

        assert!(!cart.is_empty());
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_amount(), Decimal::new(3000, 2));
    }

    #[test]
    fn line_lookup_by_id() {
        let cart = Cart {
            cart_ref: CartRef::Durable(CartId::new("CART-1")),
            user_id: UserId::new("CUST-1"),
            lines: vec![CartLine {
                line_id: CartLineId::new(7),
                product: product("PROD-A", Decimal::ONE),
                quantity: 1,
            }],
        };

        assert!(cart.line(CartLineId::new(7)).is_some());
        assert!(cart.line(CartLineId::new(8)).is_none());
    }
}
