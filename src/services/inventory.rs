//! Stock intake.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::aggregates::InventoryBatch;
use crate::domain::events::{DomainEvent, InventoryEvent};
use crate::domain::value_objects::Money;
use crate::publisher::EventPublisher;
use crate::repository::Repository;
use crate::{Result, StorefrontError};

#[derive(Clone, Debug)]
pub struct StockIntake {
    pub product_id: Uuid,
    pub quantity: u32,
    pub cost_price: Money,
    /// Defaults to now. Backdated receipts sort earlier in FIFO order.
    pub received_at: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct InventoryService {
    repo: Arc<dyn Repository>,
    events: EventPublisher,
}

impl InventoryService {
    pub fn new(repo: Arc<dyn Repository>, events: EventPublisher) -> Self {
        Self { repo, events }
    }

    /// Records a new batch and raises the product's stock counters together.
    #[instrument(skip(self), fields(product_id = %intake.product_id, quantity = intake.quantity))]
    pub async fn receive_batch(&self, intake: StockIntake) -> Result<InventoryBatch> {
        let received_at = intake.received_at.unwrap_or_else(Utc::now);
        let mut uow = self.repo.begin().await?;

        let mut product = uow.product_for_update(intake.product_id).await?.ok_or(StorefrontError::ProductNotFound)?;
        let batch = InventoryBatch::receive(product.id, intake.quantity, intake.cost_price, received_at, intake.expiry_date)?;
        product.restock(intake.quantity)?;
        uow.insert_batch(&batch).await?;
        uow.save_product_stock(&product).await?;
        uow.commit().await?;

        info!(batch_id = %batch.id, in_stock = product.stock.quantity_in_stock(), "stock received");
        self.events
            .publish(vec![DomainEvent::Inventory(InventoryEvent::Received {
                product_id: product.id,
                batch_id: batch.id,
                quantity: intake.quantity,
            })])
            .await;
        Ok(batch)
    }
}
