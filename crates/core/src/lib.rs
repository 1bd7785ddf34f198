//! Lapidary Core - Shared types library.
//!
//! This crate provides common types used across all Lapidary components:
//! - `commerce` - Cart, stock, and checkout engine
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no file
//! handling. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and the order lifecycle

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
