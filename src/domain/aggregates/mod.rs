//! Aggregates module
pub mod product;
pub mod batch;
pub mod order;
pub mod cart;
pub mod customer;
pub mod store;

pub use product::{InventoryError, Product, ProductStatus, StockLevel};
pub use batch::{BatchAllocation, BatchQueue, BatchStatus, Consumption, InventoryBatch};
pub use order::{
    ItemStatus, NewOrder, Order, OrderCharges, OrderError, OrderLineItem, OrderStatus, PaymentInfo,
    PaymentMethod, PaymentStatus, ShippingAddress, StoreGroup, TimelineEntry,
};
pub use cart::{Cart, CartError, MAX_CART_QUANTITY, MAX_LINE_QUANTITY, CartItem, CartItemDisplay, CartPricing, CartStatus, CartTotals, Coupon};
pub use customer::{Customer, ShoppingStats};
pub use store::{SalesMetrics, Store, WebsiteSettings};
