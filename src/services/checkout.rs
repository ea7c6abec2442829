//! Order placement.
//!
//! Validate, snapshot, persist the order, consume inventory, update customer
//! and store aggregates, clear the cart. Every step runs inside one unit of
//! work, so an error at any point leaves storage untouched.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{BatchQueue, CartPricing, Order, ShippingAddress};
use crate::domain::events::{DomainEvent, InventoryEvent};
use crate::domain::services::{validate_stock, OrderBuilder};
use crate::domain::value_objects::{OrderNumber, NIGERIAN_PHONE};
use crate::publisher::EventPublisher;
use crate::repository::Repository;
use crate::{Result, StorefrontError};

/// Bound on order-number attempts per checkout.
pub const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 10;

pub trait OrderNumberSource: Send + Sync {
    fn next(&self, at: DateTime<Utc>) -> OrderNumber;
}

/// Time suffix plus a random four-digit sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomOrderNumbers;

impl OrderNumberSource for RandomOrderNumbers {
    fn next(&self, at: DateTime<Utc>) -> OrderNumber {
        OrderNumber::generate(at, rand::thread_rng().gen_range(0..10_000))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressInput {
    #[serde(default)]
    #[validate(length(min = 1, code = "required"), regex(path = "NIGERIAN_PHONE", code = "phone"))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(min = 1, code = "required"))]
    pub city: String,
    #[serde(default)]
    #[validate(length(min = 1, code = "required"))]
    pub state: String,
    #[serde(default)]
    pub street: Option<String>,
}

impl ShippingAddressInput {
    /// Missing fields win over a malformed phone number.
    pub fn into_address(self) -> Result<ShippingAddress> {
        let input = Self {
            phone: self.phone.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            street: self.street.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        };
        if let Err(errors) = input.validate() {
            let incomplete = errors.field_errors().values().any(|errs| errs.iter().any(|e| e.code == "required"));
            return Err(if incomplete { StorefrontError::IncompleteAddress } else { StorefrontError::InvalidPhone });
        }
        Ok(ShippingAddress { phone: input.phone, city: input.city, state: input.state, street: input.street })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub cart_id: Uuid,
    #[serde(default)]
    pub shipping_address: ShippingAddressInput,
    #[serde(default)]
    pub customer_notes: Option<String>,
}

#[derive(Clone)]
pub struct CheckoutService {
    repo: Arc<dyn Repository>,
    pricing: CartPricing,
    numbers: Arc<dyn OrderNumberSource>,
    events: EventPublisher,
}

impl CheckoutService {
    pub fn new(repo: Arc<dyn Repository>, pricing: CartPricing, events: EventPublisher) -> Self {
        Self { repo, pricing, numbers: Arc::new(RandomOrderNumbers), events }
    }

    pub fn with_order_numbers(mut self, numbers: Arc<dyn OrderNumberSource>) -> Self {
        self.numbers = numbers;
        self
    }

    #[instrument(skip_all, fields(customer_id = %customer_id, cart_id = %request.cart_id))]
    pub async fn place_order(&self, customer_id: Uuid, request: PlaceOrder) -> Result<Order> {
        let now = Utc::now();
        let mut uow = self.repo.begin().await?;

        let mut customer = uow.customer(customer_id).await?.ok_or(StorefrontError::CustomerNotFound)?;
        let mut cart = uow
            .cart_for_update(request.cart_id)
            .await?
            .filter(|c| c.customer_id() == customer_id)
            .ok_or(StorefrontError::CartNotFound)?;
        if cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }
        // Tax and shipping follow the configuration in force now, not when the cart was last edited.
        cart.reprice(self.pricing);
        let address = request.shipping_address.into_address()?;

        let mut products = uow.products_for_update(&cart.product_ids()).await?;
        let mut store_ids: Vec<Uuid> = products.values().map(|p| p.store_id).collect();
        store_ids.sort_unstable();
        store_ids.dedup();
        let mut stores = uow.stores(&store_ids).await?;

        let report = validate_stock(&cart, &products, &stores);
        if !report.is_valid() {
            warn!(unavailable = report.unavailable_items.len(), "checkout rejected, items unavailable");
            return Err(StorefrontError::StockUnavailable(report.unavailable_items));
        }

        let builder = OrderBuilder::new(&customer, &cart, &products, &stores)
            .shipping_address(address)
            .customer_notes(request.customer_notes);
        let mut placed = None;
        for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
            let order = builder.build(self.numbers.next(now), now)?;
            if uow.insert_order(&order).await? {
                placed = Some(order);
                break;
            }
            debug!(attempt, order_number = %order.order_number(), "order number taken");
        }
        let mut order = placed.ok_or(StorefrontError::OrderNumberExhausted(MAX_ORDER_NUMBER_ATTEMPTS))?;
        let mut events = order.take_events();

        for item in order.items() {
            let batches = uow.open_batches_for_update(item.product_id).await?;
            let consumed = BatchQueue::new(batches, now).consume(item.quantity);
            for batch in &consumed.updated {
                uow.save_batch(batch).await?;
                if batch.quantity_remaining() == 0 {
                    events.push(DomainEvent::Inventory(InventoryEvent::BatchDepleted { product_id: item.product_id, batch_id: batch.id }));
                }
            }
            if consumed.shortfall > 0 {
                warn!(product_id = %item.product_id, unallocated = consumed.shortfall, "batches short of recorded stock");
                events.push(DomainEvent::Inventory(InventoryEvent::Shortfall {
                    product_id: item.product_id,
                    order_id: order.id(),
                    unallocated: consumed.shortfall,
                }));
            }
            let product = products.get_mut(&item.product_id).ok_or(StorefrontError::ProductNotFound)?;
            product.record_sale(item.quantity)?;
            uow.save_product_stock(product).await?;
        }

        customer.update_shopping_stats(order.total_amount(), now);
        uow.save_customer_stats(&customer).await?;

        for group in order.stores() {
            let store = stores.get_mut(&group.store_id).ok_or(StorefrontError::StoreNotFound)?;
            store.record_order(group.subtotal, now);
            uow.save_store_metrics(store).await?;
        }

        cart.clear_after_checkout();
        uow.save_cart(&cart).await?;
        uow.commit().await?;

        info!(
            order_id = %order.id(),
            order_number = %order.order_number(),
            total = %order.total_amount(),
            stores = order.stores().len(),
            "order placed"
        );
        self.events.publish(events).await;
        Ok(order)
    }

    pub async fn order_for_customer(&self, customer_id: Uuid, order_id: Uuid) -> Result<Order> {
        self.repo
            .find_order(order_id)
            .await?
            .filter(|o| o.customer_id() == customer_id)
            .ok_or(StorefrontError::OrderNotFound)
    }

    pub async fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>> {
        self.repo.orders_for_customer(customer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(phone: &str, city: &str, state: &str) -> ShippingAddressInput {
        ShippingAddressInput { phone: phone.into(), city: city.into(), state: state.into(), street: None }
    }

    #[test]
    fn test_address_validation() {
        let address = input(" 08031234567 ", "Lagos", "Lagos").into_address().unwrap();
        assert_eq!(address.phone, "08031234567");
        assert!(matches!(input("", "Lagos", "Lagos").into_address(), Err(StorefrontError::IncompleteAddress)));
        assert!(matches!(input("08031234567", "  ", "Lagos").into_address(), Err(StorefrontError::IncompleteAddress)));
        assert!(matches!(input("12345", "Lagos", "Lagos").into_address(), Err(StorefrontError::InvalidPhone)));
        assert!(matches!(input("+2349031234567", "Abuja", "FCT").into_address(), Ok(_)));
    }

    #[test]
    fn test_random_numbers_are_well_formed() {
        let now = Utc::now();
        for _ in 0..100 {
            let number = RandomOrderNumbers.next(now);
            assert!(OrderNumber::parse(number.as_str()).is_ok(), "{number}");
        }
    }

    #[test]
    fn test_place_order_body_accepts_partial_address() {
        let body: PlaceOrder = serde_json::from_value(serde_json::json!({
            "cartId": Uuid::nil(),
            "shippingAddress": { "phone": "08031234567" }
        })).unwrap();
        assert_eq!(body.shipping_address.city, "");
        assert!(body.customer_notes.is_none());
    }
}
