//! Storefront domain: aggregates, value objects, snapshots, events and the
//! pure parts of checkout.
pub mod aggregates;
pub mod events;
pub mod services;
pub mod snapshots;
pub mod value_objects;
