//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::snapshots::ProductSnapshot;
use crate::domain::value_objects::{Money, Sku};

/// Live product record. Checkout reads it for validation and snapshots; only
/// the stock counters are written back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub sku: Sku,
    pub name: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub unit: String,
    pub price: Money,
    pub status: ProductStatus,
    pub web_visible: bool,
    pub stock: StockLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus { #[default] Draft, Active, Archived }

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Draft => "Draft", Self::Active => "Active", Self::Archived => "Archived" }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Draft" => Some(Self::Draft),
            "Active" => Some(Self::Active),
            "Archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl Product {
    pub fn create(store_id: Uuid, sku: Sku, name: impl Into<String>, price: Money) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), store_id, sku, name: name.into(), image: None, category: None,
            unit: "piece".into(), price, status: ProductStatus::Draft, web_visible: false,
            stock: StockLevel::default(), created_at: now, updated_at: now,
        }
    }

    pub fn publish(&mut self) -> Result<(), InventoryError> {
        if self.name.trim().is_empty() { return Err(InventoryError::MissingName); }
        self.status = ProductStatus::Active;
        self.web_visible = true;
        self.touch();
        Ok(())
    }

    pub fn archive(&mut self) { self.status = ProductStatus::Archived; self.touch(); }

    /// Listed on the storefront and accepting orders.
    pub fn is_purchasable(&self) -> bool { self.web_visible && self.status == ProductStatus::Active }

    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            name: self.name.clone(),
            sku: self.sku.clone(),
            image: self.image.clone(),
            category: self.category.clone(),
            unit: self.unit.clone(),
        }
    }

    pub fn restock(&mut self, qty: u32) -> Result<(), InventoryError> {
        self.stock.restock(qty)?;
        self.touch();
        Ok(())
    }

    pub fn record_sale(&mut self, qty: u32) -> Result<(), InventoryError> {
        self.stock.record_sale(qty)?;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// Aggregate stock counters.
///
/// `total_stocked_quantity >= quantity_in_stock + sold_quantity` holds for
/// every value this type can hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    quantity_in_stock: u32,
    sold_quantity: u32,
    total_stocked_quantity: u32,
}

impl StockLevel {
    pub fn restore(quantity_in_stock: u32, sold_quantity: u32, total_stocked_quantity: u32) -> Result<Self, InventoryError> {
        let accounted = quantity_in_stock.checked_add(sold_quantity).ok_or(InventoryError::Inconsistent)?;
        if total_stocked_quantity < accounted { return Err(InventoryError::Inconsistent); }
        Ok(Self { quantity_in_stock, sold_quantity, total_stocked_quantity })
    }

    pub fn quantity_in_stock(&self) -> u32 { self.quantity_in_stock }
    pub fn sold_quantity(&self) -> u32 { self.sold_quantity }
    pub fn total_stocked_quantity(&self) -> u32 { self.total_stocked_quantity }

    pub fn restock(&mut self, qty: u32) -> Result<(), InventoryError> {
        if qty == 0 { return Err(InventoryError::InvalidQuantity); }
        let in_stock = self.quantity_in_stock.checked_add(qty).ok_or(InventoryError::Inconsistent)?;
        let total = self.total_stocked_quantity.checked_add(qty).ok_or(InventoryError::Inconsistent)?;
        self.quantity_in_stock = in_stock;
        self.total_stocked_quantity = total;
        Ok(())
    }

    pub fn record_sale(&mut self, qty: u32) -> Result<(), InventoryError> {
        if qty == 0 { return Err(InventoryError::InvalidQuantity); }
        if qty > self.quantity_in_stock {
            return Err(InventoryError::InsufficientStock { available: self.quantity_in_stock, requested: qty });
        }
        self.quantity_in_stock -= qty;
        self.sold_quantity += qty;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    MissingName,
    InvalidQuantity,
    InsufficientStock { available: u32, requested: u32 },
    Inconsistent,
}

impl std::error::Error for InventoryError {}
impl std::fmt::Display for InventoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "Missing name"),
            Self::InvalidQuantity => write!(f, "Quantity must be at least 1"),
            Self::InsufficientStock { available, requested } => write!(f, "Insufficient stock: {available} available, {requested} requested"),
            Self::Inconsistent => write!(f, "Stock counters are inconsistent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product::create(Uuid::now_v7(), Sku::new("TEST-001").unwrap(), "Test Product", Money::naira(1500))
    }

    #[test]
    fn test_product_create() {
        let p = product();
        assert_eq!(p.name, "Test Product");
        assert!(!p.is_purchasable());
    }

    #[test]
    fn test_publish_makes_purchasable() {
        let mut p = product();
        p.publish().unwrap();
        assert!(p.is_purchasable());
        p.archive();
        assert!(!p.is_purchasable());
    }

    #[test]
    fn test_inventory() {
        let mut p = product();
        p.restock(10).unwrap();
        p.record_sale(4).unwrap();
        assert_eq!(p.stock.quantity_in_stock(), 6);
        assert_eq!(p.stock.sold_quantity(), 4);
        assert_eq!(p.stock.total_stocked_quantity(), 10);
        assert_eq!(p.record_sale(7), Err(InventoryError::InsufficientStock { available: 6, requested: 7 }));
    }

    #[test]
    fn test_restore_rejects_broken_counters() {
        assert!(StockLevel::restore(5, 5, 10).is_ok());
        assert!(StockLevel::restore(5, 5, 12).is_ok());
        assert_eq!(StockLevel::restore(6, 5, 10), Err(InventoryError::Inconsistent));
    }
}
