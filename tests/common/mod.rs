#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use ivma_store::api::{self, AppState};
use ivma_store::domain::aggregates::{CartPricing, Customer, Product, Store};
use ivma_store::domain::value_objects::{Money, Sku};
use ivma_store::publisher::EventPublisher;
use ivma_store::repository::{MemoryRepository, Repository};
use ivma_store::services::{InventoryService, OrderNumberSource, StockIntake};

pub const TOKEN: &str = "session-token-ada";

pub struct Shop {
    pub repo: MemoryRepository,
    pub state: AppState,
    pub customer: Customer,
    pub ikeja: Store,
    pub aba: Store,
    /// Ikeja, ₦2,500.
    pub rice: Product,
    /// Aba, ₦1,200.
    pub soap: Product,
}

pub fn pricing() -> CartPricing {
    CartPricing { tax_rate: Decimal::new(75, 3), shipping_fee_per_store: Money::naira(1_000) }
}

impl Shop {
    pub async fn open() -> Self {
        let repo = MemoryRepository::new();
        let customer = Customer::register("Ada Obi", "ada@example.com");
        let ikeja = Store::create("Ikeja Foods");
        let aba = Store::create("Aba Essentials");
        let rice = listed(&ikeja, "RICE-5KG", "Rice 5kg", 2_500);
        let soap = listed(&aba, "SOAP-BAR", "Black Soap", 1_200);

        repo.insert_customer(customer.clone()).await;
        repo.insert_session(TOKEN, customer.id, Utc::now() + Duration::days(1)).await;
        for store in [&ikeja, &aba] { repo.insert_store(store.clone()).await; }
        for product in [&rice, &soap] { repo.insert_product(product.clone()).await; }

        let state = AppState::new(Arc::new(repo.clone()), pricing(), "ivma_session", EventPublisher::disabled());
        Self { repo, state, customer, ikeja, aba, rice, soap }
    }

    pub fn with_order_numbers(mut self, numbers: Arc<dyn OrderNumberSource>) -> Self {
        self.state = self.state.with_order_numbers(numbers);
        self
    }

    pub fn app(&self) -> Router { api::router(self.state.clone()) }

    /// Receives a batch `days_ago` days in the past.
    pub async fn receive(&self, product_id: Uuid, quantity: u32, days_ago: i64) {
        let inventory = InventoryService::new(Arc::new(self.repo.clone()), EventPublisher::disabled());
        inventory
            .receive_batch(StockIntake {
                product_id,
                quantity,
                cost_price: Money::naira(500),
                received_at: Some(Utc::now() - Duration::days(days_ago)),
                expiry_date: None,
            })
            .await
            .unwrap();
    }

    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        send(self.app(), method, uri, Some(TOKEN), body).await
    }

    /// Adds a line through the API and returns the cart id.
    pub async fn add_to_cart(&self, product_id: Uuid, quantity: u32) -> String {
        let (status, body) = self.send("POST", "/api/cart/items", Some(serde_json::json!({ "productId": product_id, "quantity": quantity }))).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["cart"]["_id"].as_str().unwrap().to_string()
    }

    pub async fn checkout(&self, cart_id: &str) -> (StatusCode, Value) {
        self.send("POST", "/api/orders/create", Some(checkout_body(cart_id, "08031234567"))).await
    }

    pub async fn in_stock(&self, product_id: Uuid) -> u32 {
        self.repo.find_product(product_id).await.unwrap().unwrap().stock.quantity_in_stock()
    }
}

fn listed(store: &Store, sku: &str, name: &str, price: i64) -> Product {
    let mut product = Product::create(store.id, Sku::new(sku).unwrap(), name, Money::naira(price));
    product.publish().unwrap();
    product
}

pub fn checkout_body(cart_id: &str, phone: &str) -> Value {
    serde_json::json!({
        "cartId": cart_id,
        "shippingAddress": { "phone": phone, "city": "Lagos", "state": "Lagos", "street": "12 Allen Avenue" },
        "customerNotes": "Call on arrival"
    })
}

pub async fn send(app: Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(token) = token {
        request = request.header("cookie", format!("theme=light; ivma_session={token}"));
    }
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, json)
}

pub fn decimal(value: &Value) -> Decimal {
    assert!(value.is_number(), "expected a JSON number, got {value}");
    value.to_string().parse().unwrap()
}
