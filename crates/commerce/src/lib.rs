//! Lapidary Commerce - cart, stock, and checkout engine.
//!
//! This crate implements the purchasing flow behind the Lapidary shop:
//! resolving a per-user shopping cart, reserving product stock as items are
//! added, and converting a selected subset of cart lines into a durable
//! order inside a single database transaction.
//!
//! # Architecture
//!
//! - [`db`] - SQLite repositories for products, carts, orders, and the stock
//!   ledger. The durable store is a single SQLite database.
//! - [`fallback`] - file-backed cart storage used when the durable store is
//!   unreachable. Fallback carts never reserve stock.
//! - [`overlay`] - persisted order-status overrides merged over the stored
//!   status on every order read.
//! - [`services`] - session-scoped orchestration: [`services::CartService`],
//!   [`services::CheckoutService`], and [`services::OrderService`].
//! - [`state`] - the [`state::Commerce`] facade wiring pool, data directory,
//!   and services together.
//!
//! # Stock reservation
//!
//! Stock is decremented when an item is added to a durable cart, not at
//! checkout. A product's stored stock therefore reads as "reserved or sold",
//! and checkout only moves lines into an order without touching stock.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod fallback;
pub mod models;
pub mod overlay;
pub mod services;
pub mod session;
pub mod state;

pub use config::CommerceConfig;
pub use error::{CommerceError, Result};
pub use session::Session;
pub use state::Commerce;
