//! Pure checkout logic shared by every storage backend.
pub mod stock;
pub mod order_builder;

pub use stock::{validate_stock, StockReport, UnavailableItem, UnavailableReason};
pub use order_builder::OrderBuilder;
