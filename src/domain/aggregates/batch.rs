//! Inventory batch ledger
//!
//! Each batch records one stock intake for a product. Sales deplete batches
//! oldest-received first through [`BatchQueue`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;
use crate::domain::aggregates::InventoryError;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryBatch {
    pub id: Uuid,
    pub product_id: Uuid,
    pub batch_number: String,
    pub cost_price: Money,
    pub date_received: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    quantity_in: u32,
    quantity_sold: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus { Active, Depleted, Expired }

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Active => "active", Self::Depleted => "depleted", Self::Expired => "expired" }
    }
}

impl InventoryBatch {
    pub fn receive(
        product_id: Uuid,
        quantity: u32,
        cost_price: Money,
        date_received: DateTime<Utc>,
        expiry_date: Option<DateTime<Utc>>,
    ) -> Result<Self, InventoryError> {
        if quantity == 0 { return Err(InventoryError::InvalidQuantity); }
        Ok(Self {
            id: Uuid::now_v7(),
            product_id,
            batch_number: format!("BATCH-{}", date_received.format("%Y%m%d%H%M%S")),
            cost_price,
            date_received,
            expiry_date,
            quantity_in: quantity,
            quantity_sold: 0,
        })
    }

    /// Rebuilds a stored batch. Sold quantities beyond the intake are clamped.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        product_id: Uuid,
        batch_number: String,
        cost_price: Money,
        date_received: DateTime<Utc>,
        expiry_date: Option<DateTime<Utc>>,
        quantity_in: u32,
        quantity_sold: u32,
    ) -> Self {
        Self {
            id, product_id, batch_number, cost_price, date_received, expiry_date,
            quantity_in, quantity_sold: quantity_sold.min(quantity_in),
        }
    }

    pub fn quantity_in(&self) -> u32 { self.quantity_in }
    pub fn quantity_sold(&self) -> u32 { self.quantity_sold }
    pub fn quantity_remaining(&self) -> u32 { self.quantity_in.saturating_sub(self.quantity_sold) }

    pub fn status(&self, now: DateTime<Utc>) -> BatchStatus {
        if self.quantity_remaining() == 0 {
            BatchStatus::Depleted
        } else if self.expiry_date.is_some_and(|expiry| expiry <= now) {
            BatchStatus::Expired
        } else {
            BatchStatus::Active
        }
    }

    /// Takes up to `qty` units and returns how many were taken.
    pub fn sell(&mut self, qty: u32) -> u32 {
        let taken = qty.min(self.quantity_remaining());
        self.quantity_sold += taken;
        taken
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BatchAllocation { pub batch_id: Uuid, pub quantity: u32 }

/// Result of consuming one order line from a [`BatchQueue`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Consumption {
    pub allocations: Vec<BatchAllocation>,
    /// Batches touched by this consumption, in their post-sale state.
    pub updated: Vec<InventoryBatch>,
    /// Units that no batch could cover.
    pub shortfall: u32,
}

/// Active batches of one product ordered by receipt date.
#[derive(Clone, Debug, Default)]
pub struct BatchQueue {
    batches: VecDeque<InventoryBatch>,
}

impl BatchQueue {
    pub fn new(batches: impl IntoIterator<Item = InventoryBatch>, now: DateTime<Utc>) -> Self {
        let mut open: Vec<_> = batches.into_iter().filter(|b| b.status(now) == BatchStatus::Active).collect();
        open.sort_by(|a, b| a.date_received.cmp(&b.date_received).then(a.id.cmp(&b.id)));
        Self { batches: open.into() }
    }

    pub fn available(&self) -> u32 { self.batches.iter().map(InventoryBatch::quantity_remaining).sum() }
    pub fn is_empty(&self) -> bool { self.batches.is_empty() }

    pub fn consume(&mut self, quantity: u32) -> Consumption {
        let mut outcome = Consumption::default();
        let mut outstanding = quantity;
        while outstanding > 0 {
            let Some(front) = self.batches.front_mut() else { break };
            let taken = front.sell(outstanding);
            outstanding -= taken;
            outcome.allocations.push(BatchAllocation { batch_id: front.id, quantity: taken });
            outcome.updated.push(front.clone());
            if front.quantity_remaining() == 0 {
                self.batches.pop_front();
            }
        }
        outcome.shortfall = outstanding;
        outcome
    }
}
