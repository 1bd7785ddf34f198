//! Persisted order-status overrides.
//!
//! Operators can change an order's status without a durable-store write
//! path for that field being available. The override lives in a small
//! properties file (`orderId=status` per line) and is merged over the
//! stored status whenever orders are read. Entries are never deleted
//! automatically.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use lapidary_core::OrderId;
use tracing::{debug, warn};

use crate::error::Result;

const OVERLAY_FILE: &str = "order-status.properties";

/// Persisted map of order id to status override.
///
/// Status values are stored verbatim; they are not validated against the
/// order lifecycle set.
#[derive(Debug)]
pub struct OrderStatusOverlay {
    path: PathBuf,
    overrides: BTreeMap<String, String>,
}

impl OrderStatusOverlay {
    /// Load the overlay from `<data_dir>/order-status.properties`.
    ///
    /// A missing or unreadable file yields an empty overlay; read failures
    /// are logged, not surfaced.
    #[must_use]
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(OVERLAY_FILE);
        let mut overrides = BTreeMap::new();

        match fs::read_to_string(&path) {
            Ok(contents) => {
                for line in contents.lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    let Some((order_id, status)) = line.split_once('=') else {
                        warn!(line, "skipping malformed status override");
                        continue;
                    };
                    overrides.insert(order_id.trim().to_string(), status.trim().to_string());
                }
                debug!(count = overrides.len(), "loaded order status overrides");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "failed to load order status overrides"),
        }

        Self { path, overrides }
    }

    /// Record a status override for an order and persist the overlay.
    ///
    /// The status is stored as given; no lifecycle validation happens here.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CommerceError::LocalIo`] if the overlay file cannot
    /// be written.
    pub fn set_status(&mut self, order_id: &OrderId, status: &str) -> Result<()> {
        self.overrides
            .insert(order_id.as_str().to_string(), status.to_string());
        self.save()?;
        Ok(())
    }

    /// The effective status for an order: the override if one exists, else
    /// the stored status unchanged.
    #[must_use]
    pub fn merged_status(&self, order_id: &OrderId, stored_status: &str) -> String {
        self.overrides
            .get(order_id.as_str())
            .cloned()
            .unwrap_or_else(|| stored_status.to_string())
    }

    fn save(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut contents = String::from("# Order status overrides (orderId=status)\n");
        for (order_id, status) in &self.overrides {
            contents.push_str(&format!("{order_id}={status}\n"));
        }

        fs::write(&self.path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn override_wins_over_stored_status() {
        let dir = TempDir::new().expect("tempdir");
        let mut overlay = OrderStatusOverlay::load(dir.path());
        let order_id = OrderId::new("ORD-1");

        assert_eq!(overlay.merged_status(&order_id, "PENDING"), "PENDING");

        overlay.set_status(&order_id, "SHIPPED").expect("set status");
        assert_eq!(overlay.merged_status(&order_id, "PENDING"), "SHIPPED");
    }

    #[test]
    fn overrides_survive_reload() {
        let dir = TempDir::new().expect("tempdir");
        let order_id = OrderId::new("ORD-42");

        {
            let mut overlay = OrderStatusOverlay::load(dir.path());
            overlay.set_status(&order_id, "DELIVERED").expect("set status");
        }

        let overlay = OrderStatusOverlay::load(dir.path());
        assert_eq!(overlay.merged_status(&order_id, "PENDING"), "DELIVERED");
    }

    #[test]
    fn arbitrary_status_strings_are_accepted() {
        let dir = TempDir::new().expect("tempdir");
        let mut overlay = OrderStatusOverlay::load(dir.path());
        let order_id = OrderId::new("ORD-9");

        overlay
            .set_status(&order_id, "AWAITING CARRIER PICKUP")
            .expect("set status");
        assert_eq!(
            overlay.merged_status(&order_id, "PENDING"),
            "AWAITING CARRIER PICKUP"
        );
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(
            dir.path().join(OVERLAY_FILE),
            "# header\nORD-1=SHIPPED\ngarbage-without-separator\n\nORD-2=PAID\n",
        )
        .expect("write overlay");

        let overlay = OrderStatusOverlay::load(dir.path());
        assert_eq!(overlay.merged_status(&OrderId::new("ORD-1"), "PENDING"), "SHIPPED");
        assert_eq!(overlay.merged_status(&OrderId::new("ORD-2"), "PENDING"), "PAID");
        assert_eq!(overlay.merged_status(&OrderId::new("ORD-3"), "PENDING"), "PENDING");
    }
}
