//! IVMA Store
//!
//! Multi-vendor storefront backend. One customer cart can hold products from
//! many independent stores; checkout turns it into a single order whose lines
//! fan out across those stores.
//!
//! ## Features
//! - Cart with derived totals, coupons and soft expiry
//! - Stock validation against live inventory
//! - Orders with frozen product/store snapshots and per-store groups
//! - FIFO consumption of inventory batches
//! - Customer and store sales metrics
//!
//! Checkout runs as one unit of work: either every write lands or none does.

pub mod api;
pub mod config;
pub mod domain;
pub mod publisher;
pub mod repository;
pub mod services;

use thiserror::Error;

use crate::domain::aggregates::{CartError, InventoryError, OrderError};
use crate::domain::services::UnavailableItem;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Cart not found")]
    CartNotFound,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Store not found")]
    StoreNotFound,

    #[error("Please provide complete shipping address")]
    IncompleteAddress,

    #[error("Please provide a valid Nigerian phone number")]
    InvalidPhone,

    #[error("Some items are unavailable")]
    StockUnavailable(Vec<UnavailableItem>),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("No unique order number after {0} attempts")]
    OrderNumberExhausted(u32),

    #[error("Stored record is corrupt: {0}")]
    CorruptRecord(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Document encoding error: {0}")]
    Document(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
