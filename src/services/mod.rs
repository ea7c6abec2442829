//! Application services
//!
//! Async orchestration over the repository. Domain rules live in
//! [`crate::domain`]; these types sequence them inside units of work and
//! publish the resulting events.

pub mod cart;
pub mod checkout;
pub mod inventory;

pub use cart::CartService;
pub use checkout::{
    CheckoutService, OrderNumberSource, PlaceOrder, RandomOrderNumbers, ShippingAddressInput, MAX_ORDER_NUMBER_ATTEMPTS,
};
pub use inventory::{InventoryService, StockIntake};
