//! Turns a validated cart into an order with frozen snapshots.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;
use crate::domain::aggregates::{
    Cart, Customer, NewOrder, Order, OrderCharges, OrderLineItem, OrderStatus, PaymentInfo, Product,
    ShippingAddress, Store,
};
use crate::domain::value_objects::OrderNumber;
use crate::{Result, StorefrontError};

pub struct OrderBuilder<'a> {
    customer: &'a Customer,
    cart: &'a Cart,
    products: &'a HashMap<Uuid, Product>,
    stores: &'a HashMap<Uuid, Store>,
    shipping_address: ShippingAddress,
    customer_notes: Option<String>,
    payment: PaymentInfo,
}

impl<'a> OrderBuilder<'a> {
    pub fn new(customer: &'a Customer, cart: &'a Cart, products: &'a HashMap<Uuid, Product>, stores: &'a HashMap<Uuid, Store>) -> Self {
        Self {
            customer, cart, products, stores,
            shipping_address: ShippingAddress::default(),
            customer_notes: None,
            payment: PaymentInfo::default(),
        }
    }

    pub fn shipping_address(mut self, address: ShippingAddress) -> Self { self.shipping_address = address; self }

    pub fn customer_notes(mut self, notes: Option<String>) -> Self {
        self.customer_notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self
    }

    /// Builds a fresh order under `number`. Callers may invoke this repeatedly
    /// when a number turns out to be taken.
    pub fn build(&self, number: OrderNumber, at: DateTime<Utc>) -> Result<Order> {
        let items = self
            .cart
            .items()
            .iter()
            .map(|item| {
                let product = self.products.get(&item.product_id).ok_or(StorefrontError::ProductNotFound)?;
                let store = self.stores.get(&product.store_id).ok_or(StorefrontError::StoreNotFound)?;
                Ok(OrderLineItem {
                    id: Uuid::now_v7(),
                    product_id: product.id,
                    store_id: store.id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    product: product.snapshot(),
                    store: store.snapshot(),
                    item_status: OrderStatus::Pending,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let totals = self.cart.totals();
        let charges = OrderCharges {
            tax: totals.tax,
            shipping_fee: totals.shipping,
            discount: totals.discount,
            coupon_code: self.cart.coupon().map(|c| c.code.clone()),
            coupon_discount: totals.coupon_discount,
        };

        Ok(Order::place(NewOrder {
            order_number: number,
            customer_id: self.customer.id,
            customer: self.customer.snapshot(),
            items,
            shipping_address: self.shipping_address.clone(),
            customer_notes: self.customer_notes.clone(),
            charges,
            payment: self.payment.clone(),
        }, at)?)
    }
}
