//! File-backed fallback cart storage.
//!
//! When the durable store is unreachable (or cart creation fails), a user's
//! cart degrades to a per-user file under `<data_dir>/local-carts/`. Each
//! record is one `lineId,productId,quantity` line. Product details are not
//! stored; they are re-resolved from the catalog on load, and a line whose
//! product can no longer be resolved is dropped. Malformed lines are
//! skipped, never fatal.

use std::fs;
use std::path::{Path, PathBuf};

use lapidary_core::{CartLineId, ProductId, UserId};
use tracing::{debug, warn};

use crate::db::ProductRepository;
use crate::error::Result;
use crate::models::{Cart, CartLine};

/// Per-user file persistence for fallback carts.
#[derive(Debug, Clone)]
pub struct FallbackCartStore {
    dir: PathBuf,
}

impl FallbackCartStore {
    /// Create a store rooted at `<data_dir>/local-carts`.
    ///
    /// The directory is created lazily on the first save.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join("local-carts"),
        }
    }

    fn path_for(&self, user_id: &UserId) -> PathBuf {
        self.dir.join(format!("{user_id}.cart"))
    }

    /// Persist a fallback cart's lines, replacing any previous record.
    ///
    /// Called synchronously after every fallback-cart mutation so the cart
    /// survives process restarts.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CommerceError::LocalIo`] if the file cannot be
    /// written.
    pub fn save(&self, cart: &Cart) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let mut contents = String::new();
        for line in &cart.lines {
            contents.push_str(&format!(
                "{},{},{}\n",
                line.line_id,
                line.product.product_id,
                line.quantity
            ));
        }

        fs::write(self.path_for(&cart.user_id), contents)?;
        debug!(user_id = %cart.user_id, lines = cart.lines.len(), "saved fallback cart");
        Ok(())
    }

    /// Load a user's persisted fallback lines, re-resolving each product
    /// from the catalog.
    ///
    /// A missing file yields an empty set. Lines whose product cannot be
    /// resolved are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CommerceError::LocalIo`] if the file exists but
    /// cannot be read.
    pub async fn load(
        &self,
        user_id: &UserId,
        catalog: &ProductRepository<'_>,
    ) -> Result<Vec<CartLine>> {
        let path = self.path_for(user_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path)?;
        let mut lines = Vec::new();

        for record in contents.lines() {
            let record = record.trim();
            if record.is_empty() {
                continue;
            }

            let Some((line_id, product_id, quantity)) = parse_record(record) else {
                warn!(user_id = %user_id, record, "skipping malformed fallback cart record");
                continue;
            };

            match catalog.get_by_id(&product_id).await {
                Ok(Some(product)) => lines.push(CartLine {
                    line_id,
                    product,
                    quantity,
                }),
                Ok(None) => {
                    debug!(user_id = %user_id, product_id = %product_id,
                        "dropping fallback line for vanished product");
                }
                Err(e) => {
                    warn!(user_id = %user_id, product_id = %product_id, error = %e,
                        "dropping fallback line, catalog lookup failed");
                }
            }
        }

        Ok(lines)
    }

    /// Remove a user's persisted fallback record entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn delete(&self, user_id: &UserId) -> std::io::Result<()> {
        let path = self.path_for(user_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn parse_record(record: &str) -> Option<(CartLineId, ProductId, i32)> {
    let mut parts = record.splitn(3, ',');
    let line_id = parts.next()?.parse::<i32>().ok()?;
    let product_id = parts.next()?;
    let quantity = parts.next()?.parse::<i32>().ok()?;
    if product_id.is_empty() || quantity < 1 {
        return None;
    }
    Some((CartLineId::new(line_id), ProductId::new(product_id), quantity))
}
