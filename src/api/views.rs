//! JSON shapes returned by the storefront API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{
    Cart, CartItemDisplay, CartStatus, CartTotals, Order, OrderLineItem, OrderStatus, PaymentInfo, ShippingAddress,
    StoreGroup, TimelineEntry,
};
use crate::domain::snapshots::CustomerSnapshot;
use crate::domain::value_objects::{Money, OrderNumber};

/// Returned by order placement and listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub order_number: OrderNumber,
    pub total_amount: Money,
    pub item_count: u32,
    pub status: OrderStatus,
    pub stores: Vec<StoreGroup>,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id(),
            order_number: o.order_number().clone(),
            total_amount: o.total_amount(),
            item_count: o.item_count(),
            status: o.status(),
            stores: o.stores(),
            created_at: o.created_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView<'a> {
    #[serde(flatten)]
    pub item: &'a OrderLineItem,
    pub subtotal: Money,
}

/// The full order document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocument<'a> {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub order_number: &'a OrderNumber,
    pub customer_id: Uuid,
    pub customer: &'a CustomerSnapshot,
    pub items: Vec<OrderLineView<'a>>,
    pub stores: Vec<StoreGroup>,
    pub shipping_address: &'a ShippingAddress,
    pub customer_notes: Option<&'a str>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping_fee: Money,
    pub discount: Money,
    pub coupon_code: Option<&'a str>,
    pub coupon_discount: Money,
    pub total_amount: Money,
    pub item_count: u32,
    pub status: OrderStatus,
    pub payment: &'a PaymentInfo,
    pub timeline: &'a [TimelineEntry],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Order> for OrderDocument<'a> {
    fn from(o: &'a Order) -> Self {
        let charges = o.charges();
        Self {
            id: o.id(),
            order_number: o.order_number(),
            customer_id: o.customer_id(),
            customer: o.customer(),
            items: o.items().iter().map(|item| OrderLineView { item, subtotal: item.subtotal() }).collect(),
            stores: o.stores(),
            shipping_address: o.shipping_address(),
            customer_notes: o.customer_notes(),
            subtotal: o.subtotal(),
            tax: charges.tax,
            shipping_fee: charges.shipping_fee,
            discount: charges.discount,
            coupon_code: charges.coupon_code.as_deref(),
            coupon_discount: charges.coupon_discount,
            total_amount: o.total_amount(),
            item_count: o.item_count(),
            status: o.status(),
            payment: o.payment(),
            timeline: o.timeline(),
            created_at: o.created_at(),
            updated_at: o.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView<'a> {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
    #[serde(flatten)]
    pub display: &'a CartItemDisplay,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView<'a> {
    /// Absent until the first item is added and the cart is saved.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub items: Vec<CartLineView<'a>>,
    #[serde(flatten)]
    pub totals: CartTotals,
    pub coupon_code: Option<&'a str>,
    pub status: CartStatus,
    pub is_expired: bool,
    pub expires_at: DateTime<Utc>,
}

impl<'a> CartView<'a> {
    pub fn saved(cart: &'a Cart, now: DateTime<Utc>) -> Self {
        Self { id: Some(cart.id()), ..Self::unsaved(cart, now) }
    }

    pub fn unsaved(cart: &'a Cart, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            items: cart
                .items()
                .iter()
                .map(|i| CartLineView {
                    product_id: i.product_id,
                    store_id: i.store_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    subtotal: i.subtotal(),
                    display: &i.display,
                })
                .collect(),
            totals: cart.totals(),
            coupon_code: cart.coupon().map(|c| c.code.as_str()),
            status: cart.status(),
            is_expired: cart.is_expired(now),
            expires_at: cart.expires_at(),
        }
    }
}
