//! In-memory backend for tests and local development.
//!
//! A unit of work holds the store-wide lock for its whole lifetime and writes
//! to a staged copy of the state; commit swaps the copy in.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Repository, UnitOfWork};
use crate::domain::aggregates::{BatchStatus, Cart, Customer, InventoryBatch, Order, Product, Store};
use crate::{Result, StorefrontError};

/// Unit-of-work step at which an injected failure fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint { InsertOrder, SaveBatch, SaveProduct, SaveCustomer, SaveStore, SaveCart, Commit }

#[derive(Clone, Debug)]
struct Session { customer_id: Uuid, expires_at: DateTime<Utc> }

#[derive(Clone, Debug, Default)]
struct State {
    customers: HashMap<Uuid, Customer>,
    sessions: HashMap<String, Session>,
    stores: HashMap<Uuid, Store>,
    products: HashMap<Uuid, Product>,
    batches: HashMap<Uuid, InventoryBatch>,
    carts: HashMap<Uuid, Cart>,
    orders: HashMap<Uuid, Order>,
    failure: Option<FailPoint>,
}

#[derive(Clone, Default)]
pub struct MemoryRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryRepository {
    pub fn new() -> Self { Self::default() }

    pub async fn insert_customer(&self, customer: Customer) { self.state.lock().await.customers.insert(customer.id, customer); }
    pub async fn insert_store(&self, store: Store) { self.state.lock().await.stores.insert(store.id, store); }
    pub async fn insert_product(&self, product: Product) { self.state.lock().await.products.insert(product.id, product); }

    pub async fn insert_session(&self, token: impl Into<String>, customer_id: Uuid, expires_at: DateTime<Utc>) {
        self.state.lock().await.sessions.insert(token.into(), Session { customer_id, expires_at });
    }

    /// Makes the next unit of work fail at `point`.
    pub async fn fail_next(&self, point: FailPoint) { self.state.lock().await.failure = Some(point); }

    pub async fn batches_for_product(&self, product_id: Uuid) -> Vec<InventoryBatch> {
        let mut batches: Vec<_> = self.state.lock().await.batches.values().filter(|b| b.product_id == product_id).cloned().collect();
        batches.sort_by_key(|b| (b.date_received, b.id));
        batches
    }

    pub async fn order_count(&self) -> usize { self.state.lock().await.orders.len() }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn customer_for_session(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Uuid>> {
        let state = self.state.lock().await;
        Ok(state.sessions.get(token).filter(|s| s.expires_at > now).map(|s| s.customer_id))
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>> { Ok(self.state.lock().await.customers.get(&id).cloned()) }
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> { Ok(self.state.lock().await.products.get(&id).cloned()) }
    async fn find_store(&self, id: Uuid) -> Result<Option<Store>> { Ok(self.state.lock().await.stores.get(&id).cloned()) }

    async fn find_cart_for_customer(&self, customer_id: Uuid) -> Result<Option<Cart>> {
        Ok(self.state.lock().await.carts.values().find(|c| c.customer_id() == customer_id).cloned())
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> { Ok(self.state.lock().await.orders.get(&id).cloned()) }

    async fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>> {
        let mut orders: Vec<_> = self.state.lock().await.orders.values().filter(|o| o.customer_id() == customer_id).cloned().collect();
        orders.sort_by_key(|o| std::cmp::Reverse((o.created_at(), o.id())));
        Ok(orders)
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let mut live = Arc::clone(&self.state).lock_owned().await;
        let failure = live.failure.take();
        let staged = live.clone();
        Ok(Box::new(MemoryUnitOfWork { live, staged, failure }))
    }
}

/// One cart per customer.
fn put_cart(state: &mut State, cart: &Cart) -> Result<()> {
    let duplicate = state.carts.values().any(|c| c.customer_id() == cart.customer_id() && c.id() != cart.id());
    if duplicate {
        return Err(StorefrontError::Storage(format!("customer {} already has a cart", cart.customer_id())));
    }
    state.carts.insert(cart.id(), cart.clone());
    Ok(())
}

pub struct MemoryUnitOfWork {
    live: OwnedMutexGuard<State>,
    staged: State,
    failure: Option<FailPoint>,
}

impl MemoryUnitOfWork {
    fn check(&self, point: FailPoint) -> Result<()> {
        if self.failure == Some(point) {
            return Err(StorefrontError::Storage(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn customer(&mut self, id: Uuid) -> Result<Option<Customer>> { Ok(self.staged.customers.get(&id).cloned()) }
    async fn cart_for_update(&mut self, id: Uuid) -> Result<Option<Cart>> { Ok(self.staged.carts.get(&id).cloned()) }

    async fn customer_cart_for_update(&mut self, customer_id: Uuid) -> Result<Option<Cart>> {
        Ok(self.staged.carts.values().find(|c| c.customer_id() == customer_id).cloned())
    }
    async fn product_for_update(&mut self, id: Uuid) -> Result<Option<Product>> { Ok(self.staged.products.get(&id).cloned()) }

    async fn products_for_update(&mut self, ids: &[Uuid]) -> Result<HashMap<Uuid, Product>> {
        Ok(ids.iter().filter_map(|id| self.staged.products.get(id)).map(|p| (p.id, p.clone())).collect())
    }

    async fn stores(&mut self, ids: &[Uuid]) -> Result<HashMap<Uuid, Store>> {
        Ok(ids.iter().filter_map(|id| self.staged.stores.get(id)).map(|s| (s.id, s.clone())).collect())
    }

    async fn open_batches_for_update(&mut self, product_id: Uuid) -> Result<Vec<InventoryBatch>> {
        let now = Utc::now();
        Ok(self.staged.batches.values()
            .filter(|b| b.product_id == product_id && b.status(now) == BatchStatus::Active)
            .cloned()
            .collect())
    }

    async fn insert_batch(&mut self, batch: &InventoryBatch) -> Result<()> {
        self.staged.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn save_batch(&mut self, batch: &InventoryBatch) -> Result<()> {
        self.check(FailPoint::SaveBatch)?;
        self.staged.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn save_product_stock(&mut self, product: &Product) -> Result<()> {
        self.check(FailPoint::SaveProduct)?;
        let stored = self.staged.products.get_mut(&product.id).ok_or(StorefrontError::ProductNotFound)?;
        stored.stock = product.stock;
        stored.updated_at = product.updated_at;
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<bool> {
        self.check(FailPoint::InsertOrder)?;
        if self.staged.orders.values().any(|o| o.order_number() == order.order_number()) {
            return Ok(false);
        }
        self.staged.orders.insert(order.id(), order.clone());
        Ok(true)
    }

    async fn save_customer_stats(&mut self, customer: &Customer) -> Result<()> {
        self.check(FailPoint::SaveCustomer)?;
        let stored = self.staged.customers.get_mut(&customer.id).ok_or(StorefrontError::CustomerNotFound)?;
        stored.stats = customer.stats.clone();
        Ok(())
    }

    async fn save_store_metrics(&mut self, store: &Store) -> Result<()> {
        self.check(FailPoint::SaveStore)?;
        let stored = self.staged.stores.get_mut(&store.id).ok_or(StorefrontError::StoreNotFound)?;
        stored.sales = store.sales.clone();
        stored.website = store.website.clone();
        Ok(())
    }

    async fn save_cart(&mut self, cart: &Cart) -> Result<()> {
        self.check(FailPoint::SaveCart)?;
        put_cart(&mut self.staged, cart)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.check(FailPoint::Commit)?;
        let MemoryUnitOfWork { mut live, staged, .. } = *self;
        *live = staged;
        Ok(())
    }
}
