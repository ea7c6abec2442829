//! Domain events
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Order(OrderEvent),
    Inventory(InventoryEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, order_number: String, customer_id: Uuid, total_amount: Money, store_ids: Vec<Uuid> },
    StatusChanged { order_id: Uuid, status: OrderStatus },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InventoryEvent {
    Received { product_id: Uuid, batch_id: Uuid, quantity: u32 },
    BatchDepleted { product_id: Uuid, batch_id: Uuid },
    /// Batches held fewer units than were sold; the aggregate count was still decremented.
    Shortfall { product_id: Uuid, order_id: Uuid, unallocated: u32 },
}

impl DomainEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Placed { .. }) => "ivma.orders.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "ivma.orders.status",
            Self::Inventory(InventoryEvent::Received { .. }) => "ivma.inventory.received",
            Self::Inventory(InventoryEvent::BatchDepleted { .. }) => "ivma.inventory.depleted",
            Self::Inventory(InventoryEvent::Shortfall { .. }) => "ivma.inventory.shortfall",
        }
    }
}
