//! Cart Aggregate
//!
//! One cart per customer. Monetary totals are never stored on the cart; they
//! are derived from the line items by [`Cart::totals`].

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{Money, Sku};

/// Inactivity window after which a cart is flagged expired.
pub const CART_TTL_DAYS: i64 = 30;

/// Most units of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 10_000;

/// Most units a cart may hold across all lines.
pub const MAX_CART_QUANTITY: u32 = 100_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cart {
    id: Uuid,
    customer_id: Uuid,
    items: Vec<CartItem>,
    pricing: CartPricing,
    discount: Money,
    coupon: Option<Coupon>,
    status: CartStatus,
    last_activity: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub quantity: u32,
    pub unit_price: Money,
    pub display: CartItemDisplay,
}

/// Denormalized fields shown in the cart drawer without extra lookups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDisplay {
    pub product_name: String,
    pub product_sku: Sku,
    pub product_image: Option<String>,
    pub store_name: String,
    pub store_slug: String,
}

impl CartItem {
    pub fn subtotal(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartPricing {
    /// Fraction of the subtotal, e.g. `0.075` for 7.5% VAT.
    pub tax_rate: Decimal,
    pub shipping_fee_per_store: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon { pub code: String, pub amount: Money }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartStatus { #[default] Active, Abandoned }

impl CartStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Active => "active", Self::Abandoned => "abandoned" }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub discount: Money,
    pub coupon_discount: Money,
    pub total: Money,
    pub item_count: u32,
}

impl CartTotals {
    pub fn compute(items: &[CartItem], pricing: &CartPricing, discount: Money, coupon: Option<&Coupon>) -> Self {
        let subtotal: Money = items.iter().map(CartItem::subtotal).sum();
        let item_count = items.iter().fold(0u32, |n, i| n.saturating_add(i.quantity));
        let tax = subtotal.percent_of(pricing.tax_rate);
        let store_count = distinct(items.iter().map(|i| i.store_id)).len() as u32;
        let shipping = pricing.shipping_fee_per_store.multiply(store_count);
        let coupon_discount = coupon.map(|c| c.amount).unwrap_or_default();
        let total = subtotal + tax + shipping - discount - coupon_discount;
        Self { subtotal, tax, shipping, discount, coupon_discount, total, item_count }
    }
}

impl Cart {
    pub fn new(customer_id: Uuid, pricing: CartPricing) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), customer_id, items: vec![], pricing, discount: Money::ZERO, coupon: None,
            status: CartStatus::Active, last_activity: now, created_at: now, updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn customer_id(&self) -> Uuid { self.customer_id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn status(&self) -> CartStatus { self.status }
    pub fn pricing(&self) -> &CartPricing { &self.pricing }
    pub fn coupon(&self) -> Option<&Coupon> { self.coupon.as_ref() }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn totals(&self) -> CartTotals { CartTotals::compute(&self.items, &self.pricing, self.discount, self.coupon.as_ref()) }

    pub fn expires_at(&self) -> DateTime<Utc> { self.last_activity + Duration::days(CART_TTL_DAYS) }
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at() }

    pub fn product_ids(&self) -> Vec<Uuid> { distinct(self.items.iter().map(|i| i.product_id)) }
    pub fn store_ids(&self) -> Vec<Uuid> { distinct(self.items.iter().map(|i| i.store_id)) }

    /// Adds a line, merging quantities with an existing line for the same product.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        let current = self.items.iter().find(|i| i.product_id == item.product_id).map_or(0, |i| i.quantity);
        let quantity = current.checked_add(item.quantity).ok_or(CartError::InvalidQuantity)?;
        self.check_quantity(item.product_id, quantity)?;
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            existing.quantity = quantity;
            existing.unit_price = item.unit_price;
            existing.display = item.display;
        } else {
            self.items.push(item);
        }
        self.status = CartStatus::Active;
        self.touch();
        Ok(())
    }

    /// Setting the quantity to zero removes the line.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 { return self.remove_item(product_id); }
        self.check_quantity(product_id, quantity)?;
        let item = self.items.iter_mut().find(|i| i.product_id == product_id).ok_or(CartError::ItemNotFound)?;
        item.quantity = quantity;
        self.touch();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        self.touch();
        Ok(())
    }

    pub fn apply_coupon(&mut self, code: impl Into<String>, amount: Money) -> Result<(), CartError> {
        if amount.is_negative() { return Err(CartError::NegativeAmount); }
        self.coupon = Some(Coupon { code: code.into(), amount });
        self.touch();
        Ok(())
    }

    pub fn remove_coupon(&mut self) { self.coupon = None; self.touch(); }

    pub fn set_discount(&mut self, amount: Money) -> Result<(), CartError> {
        if amount.is_negative() { return Err(CartError::NegativeAmount); }
        self.discount = amount;
        self.touch();
        Ok(())
    }

    pub fn reprice(&mut self, pricing: CartPricing) {
        if self.pricing != pricing { self.pricing = pricing; self.touch(); }
    }

    /// Empties the cart once its contents have become an order.
    pub fn clear_after_checkout(&mut self) {
        self.items.clear();
        self.coupon = None;
        self.discount = Money::ZERO;
        self.status = CartStatus::Abandoned;
        self.touch();
    }

    /// Rejects a line quantity outside `1..=MAX_LINE_QUANTITY` or one that
    /// would push the cart past `MAX_CART_QUANTITY`.
    fn check_quantity(&self, product_id: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 || quantity > MAX_LINE_QUANTITY { return Err(CartError::InvalidQuantity); }
        let others = self.items.iter().filter(|i| i.product_id != product_id).fold(0u32, |n, i| n.saturating_add(i.quantity));
        if others.saturating_add(quantity) > MAX_CART_QUANTITY { return Err(CartError::InvalidQuantity); }
        Ok(())
    }

    fn touch(&mut self) {
        let now = Utc::now();
        self.last_activity = now;
        self.updated_at = now;
    }
}

/// Unique values in first-seen order.
fn distinct(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = Vec::new();
    for id in ids { if !seen.contains(&id) { seen.push(id); } }
    seen
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { ItemNotFound, InvalidQuantity, NegativeAmount }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound => write!(f, "Item not found in cart"),
            Self::InvalidQuantity => write!(f, "Quantity must be between 1 and {MAX_LINE_QUANTITY}"),
            Self::NegativeAmount => write!(f, "Amount cannot be negative"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(product_id: Uuid, store_id: Uuid, quantity: u32, price: i64) -> CartItem {
        CartItem {
            product_id, store_id, quantity, unit_price: Money::naira(price),
            display: CartItemDisplay {
                product_name: "Widget".into(), product_sku: Sku::new("W1").unwrap(), product_image: None,
                store_name: "Shop".into(), store_slug: "shop".into(),
            },
        }
    }

    fn assert_invariants(cart: &Cart) {
        let t = cart.totals();
        assert_eq!(t.subtotal, cart.items().iter().map(CartItem::subtotal).sum::<Money>());
        assert_eq!(t.total, t.subtotal + t.tax + t.shipping - t.discount - t.coupon_discount);
        assert_eq!(t.item_count, cart.items().iter().map(|i| i.quantity).sum::<u32>());
    }

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::new(Uuid::now_v7(), CartPricing::default());
        let p1 = Uuid::now_v7();
        let store = Uuid::now_v7();
        cart.add_item(item(p1, store, 2, 10)).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.totals().subtotal, Money::naira(20));
        cart.add_item(item(p1, store, 1, 10)).unwrap();
        assert_eq!(cart.items()[0].quantity, 3); // Merged
        assert_eq!(cart.totals().item_count, 3);
        cart.update_quantity(p1, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.remove_item(p1), Err(CartError::ItemNotFound));
    }

    #[test]
    fn test_pricing_and_adjustments() {
        let pricing = CartPricing { tax_rate: Decimal::new(75, 3), shipping_fee_per_store: Money::naira(1500) };
        let mut cart = Cart::new(Uuid::now_v7(), pricing);
        cart.add_item(item(Uuid::now_v7(), Uuid::now_v7(), 2, 1000)).unwrap();
        cart.add_item(item(Uuid::now_v7(), Uuid::now_v7(), 1, 4000)).unwrap();
        cart.apply_coupon("WELCOME", Money::naira(500)).unwrap();
        cart.set_discount(Money::naira(100)).unwrap();
        let t = cart.totals();
        assert_eq!(t.subtotal, Money::naira(6000));
        assert_eq!(t.tax, Money::naira(450));
        assert_eq!(t.shipping, Money::naira(3000));
        assert_eq!(t.total, Money::naira(6000 + 450 + 3000 - 100 - 500));
        assert_eq!(cart.set_discount(Money::naira(-1)), Err(CartError::NegativeAmount));
    }

    #[test]
    fn test_clear_after_checkout_marks_abandoned() {
        let mut cart = Cart::new(Uuid::now_v7(), CartPricing::default());
        cart.add_item(item(Uuid::now_v7(), Uuid::now_v7(), 1, 10)).unwrap();
        cart.apply_coupon("X", Money::naira(5)).unwrap();
        cart.clear_after_checkout();
        assert!(cart.is_empty());
        assert_eq!(cart.status(), CartStatus::Abandoned);
        assert_eq!(cart.totals(), CartTotals::default());
        cart.add_item(item(Uuid::now_v7(), Uuid::now_v7(), 1, 10)).unwrap();
        assert_eq!(cart.status(), CartStatus::Active);
    }

    #[test]
    fn test_soft_expiry() {
        let cart = Cart::new(Uuid::now_v7(), CartPricing::default());
        assert!(!cart.is_expired(Utc::now()));
        assert!(cart.is_expired(Utc::now() + Duration::days(CART_TTL_DAYS)));
    }

    #[test]
    fn test_quantity_ceilings() {
        let store = Uuid::now_v7();
        let (rice, soap) = (Uuid::now_v7(), Uuid::now_v7());
        let mut cart = Cart::new(Uuid::now_v7(), CartPricing::default());

        assert_eq!(cart.add_item(item(rice, store, 0, 10)), Err(CartError::InvalidQuantity));
        assert_eq!(cart.add_item(item(rice, store, 3_000_000_000, 10)), Err(CartError::InvalidQuantity));
        assert_eq!(cart.add_item(item(rice, store, u32::MAX, 10)), Err(CartError::InvalidQuantity));
        assert!(cart.is_empty());

        cart.add_item(item(rice, store, MAX_LINE_QUANTITY, 10)).unwrap();
        assert_eq!(cart.add_item(item(rice, store, 1, 10)), Err(CartError::InvalidQuantity));
        assert_eq!(cart.update_quantity(rice, MAX_LINE_QUANTITY + 1), Err(CartError::InvalidQuantity));
        assert_eq!(cart.items()[0].quantity, MAX_LINE_QUANTITY);

        for _ in 1..(MAX_CART_QUANTITY / MAX_LINE_QUANTITY) {
            cart.add_item(item(Uuid::now_v7(), store, MAX_LINE_QUANTITY, 10)).unwrap();
        }
        assert_eq!(cart.totals().item_count, MAX_CART_QUANTITY);
        assert_eq!(cart.add_item(item(soap, store, 1, 10)), Err(CartError::InvalidQuantity));
        cart.update_quantity(rice, 1).unwrap();
        cart.add_item(item(soap, store, 2, 10)).unwrap();
        assert_invariants(&cart);
    }

    #[derive(Debug, Clone)]
    enum Op { Add(usize, u32), Update(usize, u32), Remove(usize) }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize, 1..20u32).prop_map(|(p, q)| Op::Add(p, q)),
            (0..4usize, 0..20u32).prop_map(|(p, q)| Op::Update(p, q)),
            (0..4usize).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn totals_hold_after_every_mutation(ops in proptest::collection::vec(op(), 1..40), rate in 0u32..200) {
            let pricing = CartPricing { tax_rate: Decimal::new(rate as i64, 3), shipping_fee_per_store: Money::naira(700) };
            let mut cart = Cart::new(Uuid::now_v7(), pricing);
            let stores = [Uuid::now_v7(), Uuid::now_v7()];
            let products: Vec<Uuid> = (0..4).map(|_| Uuid::now_v7()).collect();
            cart.apply_coupon("P", Money::naira(50)).unwrap();
            for op in ops {
                // Missing lines are expected errors; invariants must hold regardless.
                let _ = match op {
                    Op::Add(p, q) => cart.add_item(item(products[p], stores[p % 2], q, 250 + p as i64)),
                    Op::Update(p, q) => cart.update_quantity(products[p], q),
                    Op::Remove(p) => cart.remove_item(products[p]),
                };
                assert_invariants(&cart);
            }
        }
    }
}
