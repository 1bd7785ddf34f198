//! Engine facade wiring pool, data directory, and services together.

use std::path::Path;

use sqlx::SqlitePool;

use crate::config::CommerceConfig;
use crate::db;
use crate::error::Result;
use crate::fallback::FallbackCartStore;
use crate::overlay::OrderStatusOverlay;
use crate::services::{CartService, CheckoutService, OrderService};

/// The assembled commerce engine.
///
/// Owns the connection pool and exposes the three services. Construct once
/// and share; the pool is cheaply cloneable.
#[derive(Debug)]
pub struct Commerce {
    pool: SqlitePool,
    /// Cart resolution and mutation.
    pub cart: CartService,
    /// Atomic order creation.
    pub checkout: CheckoutService,
    /// Order reads and status overrides.
    pub orders: OrderService,
}

impl Commerce {
    /// Connect, migrate, and assemble the engine from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CommerceError::Persistence`] if the database cannot
    /// be reached or migrated.
    pub async fn from_config(config: &CommerceConfig) -> Result<Self> {
        let pool = db::create_pool(&config.database_url)
            .await
            .map_err(db::RepositoryError::from)?;
        db::migrate(&pool).await.map_err(db::RepositoryError::from)?;
        Ok(Self::new(pool, &config.data_dir))
    }

    /// Assemble the engine over an existing pool.
    #[must_use]
    pub fn new(pool: SqlitePool, data_dir: &Path) -> Self {
        let fallback = FallbackCartStore::new(data_dir);
        let overlay = OrderStatusOverlay::load(data_dir);

        Self {
            cart: CartService::new(pool.clone(), fallback),
            checkout: CheckoutService::new(pool.clone()),
            orders: OrderService::new(pool.clone(), overlay),
            pool,
        }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
