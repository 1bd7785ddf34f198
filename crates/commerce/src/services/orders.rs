//! Order reads and operator status updates.
//!
//! Every listing merges the status overlay over the stored status, so an
//! operator's override takes effect for all subsequent reads without a
//! write to the order header.

use lapidary_core::OrderId;
use sqlx::SqlitePool;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::models::Order;
use crate::overlay::OrderStatusOverlay;
use crate::session::Session;

/// Read-side order service with overlay-merged statuses.
#[derive(Debug)]
pub struct OrderService {
    pool: SqlitePool,
    overlay: OrderStatusOverlay,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: SqlitePool, overlay: OrderStatusOverlay) -> Self {
        Self { pool, overlay }
    }

    /// List the session user's orders, newest first, statuses merged
    /// through the overlay.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CommerceError::Unauthenticated`] for anonymous
    /// sessions and [`crate::CommerceError::Persistence`] on store
    /// failures.
    pub async fn list_for_user(&self, session: &Session) -> Result<Vec<Order>> {
        let user_id = session.require_user()?;

        let repo = OrderRepository::new(&self.pool);
        let mut orders = repo.list_for_user(user_id).await?;

        for order in &mut orders {
            order.status = self.overlay.merged_status(&order.order_id, &order.status);
        }

        Ok(orders)
    }

    /// Record a status override for an order.
    ///
    /// The status string is stored verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CommerceError::LocalIo`] if the overlay cannot be
    /// persisted.
    pub fn update_status(&mut self, order_id: &OrderId, status: &str) -> Result<()> {
        self.overlay.set_status(order_id, status)
    }

    /// The effective status for an order given its stored status.
    #[must_use]
    pub fn merged_status(&self, order_id: &OrderId, stored_status: &str) -> String {
        self.overlay.merged_status(order_id, stored_status)
    }

    /// Number of orders the session user has placed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CommerceError::Unauthenticated`] for anonymous
    /// sessions and [`crate::CommerceError::Persistence`] on store
    /// failures.
    pub async fn order_count(&self, session: &Session) -> Result<i64> {
        let user_id = session.require_user()?;
        let repo = OrderRepository::new(&self.pool);
        Ok(repo.order_count(user_id).await?)
    }

    /// Total units the session user has purchased across all orders.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CommerceError::Unauthenticated`] for anonymous
    /// sessions and [`crate::CommerceError::Persistence`] on store
    /// failures.
    pub async fn items_purchased(&self, session: &Session) -> Result<i64> {
        let user_id = session.require_user()?;
        let repo = OrderRepository::new(&self.pool);
        Ok(repo.items_purchased(user_id).await?)
    }
}
