//! HTTP surface
//!
//! Axum router over the checkout and cart services. Every `/api` route is
//! authenticated by the session cookie.

pub mod cart;
pub mod error;
pub mod orders;
pub mod session;
pub mod views;

pub use error::ApiError;
pub use session::CurrentCustomer;

use axum::{routing::{get, post, put}, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::domain::aggregates::CartPricing;
use crate::publisher::EventPublisher;
use crate::repository::Repository;
use crate::services::{CartService, CheckoutService, OrderNumberSource};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub checkout: CheckoutService,
    pub carts: CartService,
    pub session_cookie: Arc<str>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, pricing: CartPricing, session_cookie: &str, events: EventPublisher) -> Self {
        Self {
            checkout: CheckoutService::new(Arc::clone(&repo), pricing, events),
            carts: CartService::new(Arc::clone(&repo), pricing),
            repo,
            session_cookie: Arc::from(session_cookie),
        }
    }

    pub fn from_config(repo: Arc<dyn Repository>, config: &Config, events: EventPublisher) -> Self {
        Self::new(repo, config.pricing, &config.session_cookie, events)
    }

    pub fn with_order_numbers(mut self, numbers: Arc<dyn OrderNumberSource>) -> Self {
        self.checkout = self.checkout.with_order_numbers(numbers);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "ivma-store"})) }))
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/create", post(orders::create_order))
        .route("/api/orders/:id", get(orders::get_order))
        .route("/api/cart", get(cart::get_cart))
        .route("/api/cart/items", post(cart::add_item))
        .route("/api/cart/items/:product_id", put(cart::update_item).delete(cart::remove_item))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
