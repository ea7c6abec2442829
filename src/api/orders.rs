//! Order endpoints.

use axum::{extract::{rejection::JsonRejection, Path, State}, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use super::views::{OrderDocument, OrderSummary};
use super::{ApiError, AppState, CurrentCustomer};
use crate::services::PlaceOrder;

pub async fn create_order(
    State(s): State<AppState>,
    CurrentCustomer(customer_id): CurrentCustomer,
    body: Result<Json<PlaceOrder>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;
    let order = s
        .checkout
        .place_order(customer_id, request)
        .await
        .map_err(|e| ApiError::from(e).or_internal("Failed to create order"))?;
    Ok(Json(json!({ "success": true, "order": OrderSummary::from(&order) })))
}

pub async fn get_order(
    State(s): State<AppState>,
    CurrentCustomer(customer_id): CurrentCustomer,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let order = s.checkout.order_for_customer(customer_id, id).await?;
    Ok(Json(json!({ "success": true, "order": OrderDocument::from(&order) })))
}

pub async fn list_orders(State(s): State<AppState>, CurrentCustomer(customer_id): CurrentCustomer) -> Result<Json<Value>, ApiError> {
    let orders = s.checkout.orders_for_customer(customer_id).await?;
    let orders: Vec<OrderSummary> = orders.iter().map(OrderSummary::from).collect();
    Ok(Json(json!({ "success": true, "orders": orders })))
}
