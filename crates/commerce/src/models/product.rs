//! Product domain models.
//!
//! The catalog owns products; the commerce engine reads them and, through
//! the stock ledger, adjusts the authoritative stock count.

use lapidary_core::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub product_id: ProductId,
    /// Display name.
    pub name: String,
    /// Category (e.g. "Rings", "Necklaces").
    pub category: String,
    /// Primary material (e.g. "Gold", "Silver").
    pub material: String,
    /// Unit price. Must be positive for the product to be sellable.
    pub price: Decimal,
    /// Authoritative availability count; reads as "not yet reserved or sold".
    pub stock: i32,
    /// Free-form description.
    pub description: String,
    /// Weight in grams.
    pub weight: f64,
    /// Whether the piece carries a gemstone.
    pub has_gemstone: bool,
    /// Gemstone type, when `has_gemstone` is set.
    pub gemstone_type: Option<String>,
}

/// Outcome of resolving a product reference on a read path.
///
/// Order lines outlive their products: a product can be retired from the
/// catalog while historical orders still reference it. Readers get to see
/// which of the three cases they are looking at instead of null-checking
/// joined columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProductLookup {
    /// The catalog still carries the product; this is authoritative data.
    Found(Product),
    /// The product is gone from the catalog; this is a best-effort
    /// placeholder rebuilt from the order line itself.
    Reconstructed(Product),
    /// No usable product data at all.
    Missing,
}

impl ProductLookup {
    /// The product data, whether authoritative or reconstructed.
    #[must_use]
    pub const fn product(&self) -> Option<&Product> {
        match self {
            Self::Found(p) | Self::Reconstructed(p) => Some(p),
            Self::Missing => None,
        }
    }

    /// Whether the data came straight from the catalog.
    #[must_use]
    pub const fn is_authoritative(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product {
            product_id: ProductId::new("PROD-1"),
            name: "Emerald Ring".to_string(),
            category: "Rings".to_string(),
            material: "Gold".to_string(),
            price: Decimal::new(1250, 2),
            stock: 3,
            description: String::new(),
            weight: 4.2,
            has_gemstone: true,
            gemstone_type: Some("Emerald".to_string()),
        }
    }

    #[test]
    fn lookup_exposes_product_for_found_and_reconstructed() {
        assert!(ProductLookup::Found(sample()).product().is_some());
        assert!(ProductLookup::Reconstructed(sample()).product().is_some());
        assert!(ProductLookup::Missing.product().is_none());
    }

    #[test]
    fn only_found_is_authoritative() {
        assert!(ProductLookup::Found(sample()).is_authoritative());
        assert!(!ProductLookup::Reconstructed(sample()).is_authoritative());
        assert!(!ProductLookup::Missing.is_authoritative());
    }
}
