//! Order domain models.

use chrono::{DateTime, Utc};
use lapidary_core::{OrderId, ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::ProductLookup;

/// A placed order.
///
/// The status field holds the overlay-merged value, which may carry an
/// operator-written string outside the standard lifecycle set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID, generated at checkout.
    pub order_id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Lifecycle status after overlay merge.
    pub status: String,
    /// Opaque payment method label recorded with the order.
    pub payment_method: String,
    /// Shipping address as entered at checkout.
    pub shipping_address: String,
    /// Free-form notes.
    pub notes: String,
    /// Order total as supplied at checkout.
    pub total_amount: Decimal,
    /// When the order was placed.
    pub order_date: DateTime<Utc>,
    /// Line items, in insertion order.
    pub lines: Vec<OrderLine>,
}

/// One line of an order.
///
/// Quantity and unit price are captured at checkout and never re-derived,
/// so historical orders are immune to later price changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Product the line was sold against.
    pub product_id: ProductId,
    /// Catalog resolution of the product at read time.
    pub product: ProductLookup,
    /// Units sold.
    pub quantity: i32,
    /// Unit price at the moment of checkout.
    pub unit_price: Decimal,
}

/// Caller-supplied details for a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutInput {
    /// Opaque payment method label. Recorded, never validated or settled.
    pub payment_method: String,
    /// Shipping address.
    pub shipping_address: String,
    /// Optional free-form notes.
    pub notes: Option<String>,
    /// Total amount for the selected lines.
    pub total_amount: Decimal,
}
