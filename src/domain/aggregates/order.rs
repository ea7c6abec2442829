//! Order Aggregate
//!
//! Line items are frozen at checkout. Only statuses and the timeline change
//! afterwards. Subtotal, total, item count and the per-store groups are
//! computed from `items` on every read and cannot be set directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::snapshots::{CustomerSnapshot, ProductSnapshot, StoreSnapshot};
use crate::domain::value_objects::{Money, OrderNumber};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    id: Uuid,
    order_number: OrderNumber,
    customer_id: Uuid,
    customer: CustomerSnapshot,
    items: Vec<OrderLineItem>,
    shipping_address: ShippingAddress,
    customer_notes: Option<String>,
    charges: OrderCharges,
    status: OrderStatus,
    payment: PaymentInfo,
    timeline: Vec<TimelineEntry>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub quantity: u32,
    pub unit_price: Money,
    pub product: ProductSnapshot,
    pub store: StoreSnapshot,
    pub item_status: OrderStatus,
}

impl OrderLineItem {
    pub fn subtotal(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub phone: String,
    pub city: String,
    pub state: String,
    pub street: Option<String>,
}

/// Charges copied from the cart at checkout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCharges {
    pub tax: Money,
    pub shipping_fee: Money,
    pub discount: Money,
    pub coupon_code: Option<String>,
    pub coupon_discount: Money,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Confirmed, Processing, Shipped, Delivered, Cancelled }

/// Per-line fulfillment status; it shares the order lifecycle.
pub type ItemStatus = OrderStatus;

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Confirmed => 1,
            Self::Processing => 2,
            Self::Shipped => 3,
            Self::Delivered => 4,
            Self::Cancelled => u8::MAX,
        }
    }

    /// Forward moves only; cancellation is possible until the goods ship.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match next {
            Self::Cancelled => matches!(self, Self::Pending | Self::Confirmed | Self::Processing),
            _ => *self != Self::Cancelled && next.rank() > self.rank(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { #[default] PayOnDelivery, BankTransfer, Card }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Paid, Refunded }

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo { pub method: PaymentMethod, pub status: PaymentStatus }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry { pub status: OrderStatus, pub note: String, pub at: DateTime<Utc> }

/// Summary of one store's share of an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreGroup {
    pub store_id: Uuid,
    pub store_name: String,
    pub subtotal: Money,
    pub item_count: u32,
    pub status: OrderStatus,
}

/// Everything an order is built from, assembled by the order builder.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_id: Uuid,
    pub customer: CustomerSnapshot,
    pub items: Vec<OrderLineItem>,
    pub shipping_address: ShippingAddress,
    pub customer_notes: Option<String>,
    pub charges: OrderCharges,
    pub payment: PaymentInfo,
}

impl Order {
    pub fn place(new: NewOrder, at: DateTime<Utc>) -> Result<Self, OrderError> {
        if new.items.is_empty() { return Err(OrderError::NoItems); }
        let id = Uuid::now_v7();
        let mut order = Self {
            id,
            order_number: new.order_number,
            customer_id: new.customer_id,
            customer: new.customer,
            items: new.items,
            shipping_address: new.shipping_address,
            customer_notes: new.customer_notes,
            charges: new.charges,
            status: OrderStatus::Pending,
            payment: new.payment,
            timeline: vec![TimelineEntry { status: OrderStatus::Pending, note: "Order placed".into(), at }],
            created_at: at,
            updated_at: at,
            events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: id,
            order_number: order.order_number.to_string(),
            customer_id: order.customer_id,
            total_amount: order.total_amount(),
            store_ids: order.stores().iter().map(|g| g.store_id).collect(),
        }));
        Ok(order)
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_number(&self) -> &OrderNumber { &self.order_number }
    pub fn customer_id(&self) -> Uuid { self.customer_id }
    pub fn customer(&self) -> &CustomerSnapshot { &self.customer }
    pub fn items(&self) -> &[OrderLineItem] { &self.items }
    pub fn shipping_address(&self) -> &ShippingAddress { &self.shipping_address }
    pub fn customer_notes(&self) -> Option<&str> { self.customer_notes.as_deref() }
    pub fn charges(&self) -> &OrderCharges { &self.charges }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment(&self) -> &PaymentInfo { &self.payment }
    pub fn timeline(&self) -> &[TimelineEntry] { &self.timeline }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn subtotal(&self) -> Money { self.items.iter().map(OrderLineItem::subtotal).sum() }
    pub fn item_count(&self) -> u32 { self.items.iter().fold(0u32, |n, i| n.saturating_add(i.quantity)) }

    pub fn total_amount(&self) -> Money {
        let c = &self.charges;
        self.subtotal() + c.tax + c.shipping_fee - c.discount - c.coupon_discount
    }

    /// One group per distinct store, in the order stores first appear.
    pub fn stores(&self) -> Vec<StoreGroup> {
        let mut groups: Vec<StoreGroup> = Vec::new();
        for item in &self.items {
            match groups.iter_mut().find(|g| g.store_id == item.store_id) {
                Some(group) => {
                    group.subtotal += item.subtotal();
                    group.item_count = group.item_count.saturating_add(item.quantity);
                }
                None => groups.push(StoreGroup {
                    store_id: item.store_id,
                    store_name: item.store.name.clone(),
                    subtotal: item.subtotal(),
                    item_count: item.quantity,
                    status: OrderStatus::Pending,
                }),
            }
        }
        for group in &mut groups {
            group.status = group_status(self.items.iter().filter(|i| i.store_id == group.store_id).map(|i| i.item_status));
        }
        groups
    }

    /// Moves the whole order. Cancelling also cancels every line that can still be cancelled.
    pub fn update_status(&mut self, next: OrderStatus, note: impl Into<String>, at: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        if next == OrderStatus::Cancelled {
            for item in self.items.iter_mut().filter(|i| i.item_status.can_transition_to(OrderStatus::Cancelled)) {
                item.item_status = OrderStatus::Cancelled;
            }
        }
        self.timeline.push(TimelineEntry { status: next, note: note.into(), at });
        self.updated_at = at;
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id, status: next }));
        Ok(())
    }

    /// Moves one line independently of the rest of the order, e.g. when one vendor ships early.
    pub fn update_item_status(&mut self, item_id: Uuid, next: ItemStatus, at: DateTime<Utc>) -> Result<(), OrderError> {
        let item = self.items.iter_mut().find(|i| i.id == item_id).ok_or(OrderError::ItemNotFound)?;
        if !item.item_status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from: item.item_status, to: next });
        }
        item.item_status = next;
        let note = format!("{} marked {}", item.product.name, next.as_str());
        self.timeline.push(TimelineEntry { status: self.status, note, at });
        self.updated_at = at;
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

/// All cancelled reads as cancelled; otherwise the least advanced live line wins.
fn group_status(statuses: impl Iterator<Item = OrderStatus>) -> OrderStatus {
    statuses
        .filter(|s| *s != OrderStatus::Cancelled)
        .min_by_key(OrderStatus::rank)
        .unwrap_or(OrderStatus::Cancelled)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError { NoItems, ItemNotFound, InvalidTransition { from: OrderStatus, to: OrderStatus } }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoItems => write!(f, "No items"),
            Self::ItemNotFound => write!(f, "Order item not found"),
            Self::InvalidTransition { from, to } => write!(f, "Cannot move from {} to {}", from.as_str(), to.as_str()),
        }
    }
}
