//! Stock validation run before any checkout write.

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;
use crate::domain::aggregates::{Cart, Product, Store};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnavailableReason {
    #[serde(rename = "Product no longer available")]
    NoLongerAvailable,
    #[serde(rename = "Insufficient stock")]
    InsufficientStock,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub requested_quantity: u32,
    pub reason: UnavailableReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReport {
    pub unavailable_items: Vec<UnavailableItem>,
}

impl StockReport {
    pub fn is_valid(&self) -> bool { self.unavailable_items.is_empty() }
}

/// Checks every cart line against the live product records.
///
/// A line fails when its product is gone, hidden, not `Active`, sold by a
/// store that no longer exists, or short on stock.
pub fn validate_stock(cart: &Cart, products: &HashMap<Uuid, Product>, stores: &HashMap<Uuid, Store>) -> StockReport {
    let unavailable_items = cart
        .items()
        .iter()
        .filter_map(|item| {
            let unavailable = |reason, available_quantity| UnavailableItem {
                product_id: item.product_id,
                product_name: item.display.product_name.clone(),
                requested_quantity: item.quantity,
                reason,
                available_quantity,
            };
            match products.get(&item.product_id) {
                Some(p) if p.is_purchasable() && stores.contains_key(&p.store_id) => {
                    let available = p.stock.quantity_in_stock();
                    (available < item.quantity).then(|| unavailable(UnavailableReason::InsufficientStock, Some(available)))
                }
                _ => Some(unavailable(UnavailableReason::NoLongerAvailable, None)),
            }
        })
        .collect();
    StockReport { unavailable_items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{CartItem, CartItemDisplay, CartPricing};
    use crate::domain::value_objects::{Money, Sku};

    struct Fixture { cart: Cart, products: HashMap<Uuid, Product>, stores: HashMap<Uuid, Store> }

    fn fixture(stock: u32, requested: u32) -> (Fixture, Uuid) {
        let store = Store::create("Shop");
        let mut product = Product::create(store.id, Sku::new("SKU-1").unwrap(), "Rice 5kg", Money::naira(9000));
        product.publish().unwrap();
        if stock > 0 { product.restock(stock).unwrap(); }
        let mut cart = Cart::new(Uuid::now_v7(), CartPricing::default());
        cart.add_item(CartItem {
            product_id: product.id, store_id: store.id, quantity: requested, unit_price: product.price,
            display: CartItemDisplay {
                product_name: product.name.clone(), product_sku: product.sku.clone(), product_image: None,
                store_name: store.name.clone(), store_slug: store.slug.clone(),
            },
        }).unwrap();
        let id = product.id;
        (Fixture { cart, products: HashMap::from([(product.id, product)]), stores: HashMap::from([(store.id, store)]) }, id)
    }

    #[test]
    fn test_sufficient_stock_passes() {
        let (f, _) = fixture(5, 5);
        assert!(validate_stock(&f.cart, &f.products, &f.stores).is_valid());
    }

    #[test]
    fn test_insufficient_stock_reports_available() {
        let (f, id) = fixture(2, 3);
        let report = validate_stock(&f.cart, &f.products, &f.stores);
        assert_eq!(report.unavailable_items, vec![UnavailableItem {
            product_id: id, product_name: "Rice 5kg".into(), requested_quantity: 3,
            reason: UnavailableReason::InsufficientStock, available_quantity: Some(2),
        }]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["unavailableItems"][0]["reason"], "Insufficient stock");
        assert_eq!(json["unavailableItems"][0]["availableQuantity"], 2);
    }

    #[test]
    fn test_missing_hidden_or_inactive_products_fail() {
        let (mut f, id) = fixture(10, 1);
        f.products.get_mut(&id).unwrap().web_visible = false;
        let report = validate_stock(&f.cart, &f.products, &f.stores);
        assert_eq!(report.unavailable_items[0].reason, UnavailableReason::NoLongerAvailable);
        assert_eq!(report.unavailable_items[0].available_quantity, None);

        let (mut f, id) = fixture(10, 1);
        f.products.get_mut(&id).unwrap().archive();
        assert!(!validate_stock(&f.cart, &f.products, &f.stores).is_valid());

        let (mut f, id) = fixture(10, 1);
        f.products.remove(&id);
        let json = serde_json::to_value(validate_stock(&f.cart, &f.products, &f.stores)).unwrap();
        assert_eq!(json["unavailableItems"][0]["reason"], "Product no longer available");
        assert!(json["unavailableItems"][0].get("availableQuantity").is_none());
    }
}
