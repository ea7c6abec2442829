//! Storage ports.
//!
//! Reads that need no consistency with other writes go through
//! [`Repository`] directly. Every write (cart edits, checkout, stock intake)
//! runs inside a
//! [`UnitOfWork`]: rows read through it are locked until commit, and dropping
//! it without committing discards every write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Customer, InventoryBatch, Order, Product, Store};
use crate::Result;

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryRepository};
pub use postgres::PgRepository;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Resolves a session token to its customer, ignoring expired sessions.
    async fn customer_for_session(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Uuid>>;
    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;
    async fn find_store(&self, id: Uuid) -> Result<Option<Store>>;
    async fn find_cart_for_customer(&self, customer_id: Uuid) -> Result<Option<Cart>>;
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>>;
    /// Newest first.
    async fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>>;
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    async fn customer(&mut self, id: Uuid) -> Result<Option<Customer>>;
    async fn cart_for_update(&mut self, id: Uuid) -> Result<Option<Cart>>;
    async fn customer_cart_for_update(&mut self, customer_id: Uuid) -> Result<Option<Cart>>;
    async fn product_for_update(&mut self, id: Uuid) -> Result<Option<Product>>;
    /// Locks in id order so that concurrent checkouts cannot deadlock.
    async fn products_for_update(&mut self, ids: &[Uuid]) -> Result<HashMap<Uuid, Product>>;
    async fn stores(&mut self, ids: &[Uuid]) -> Result<HashMap<Uuid, Store>>;
    /// Batches still holding stock, any order; callers sort through `BatchQueue`.
    async fn open_batches_for_update(&mut self, product_id: Uuid) -> Result<Vec<InventoryBatch>>;
    async fn insert_batch(&mut self, batch: &InventoryBatch) -> Result<()>;
    async fn save_batch(&mut self, batch: &InventoryBatch) -> Result<()>;
    async fn save_product_stock(&mut self, product: &Product) -> Result<()>;
    /// Returns `false`, writing nothing, when the order number is already taken.
    async fn insert_order(&mut self, order: &Order) -> Result<bool>;
    async fn save_customer_stats(&mut self, customer: &Customer) -> Result<()>;
    async fn save_store_metrics(&mut self, store: &Store) -> Result<()>;
    async fn save_cart(&mut self, cart: &Cart) -> Result<()>;
    async fn commit(self: Box<Self>) -> Result<()>;
}
