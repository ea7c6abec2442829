//! Cart endpoints.

use axum::{extract::{rejection::JsonRejection, Path, State}, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::views::CartView;
use super::{ApiError, AppState, CurrentCustomer};
use crate::domain::aggregates::Cart;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest { pub product_id: Uuid, pub quantity: u32 }

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest { pub quantity: u32 }

fn respond(cart: &Cart) -> Json<Value> {
    Json(json!({ "success": true, "cart": CartView::saved(cart, Utc::now()) }))
}

pub async fn get_cart(State(s): State<AppState>, CurrentCustomer(customer_id): CurrentCustomer) -> Result<Json<Value>, ApiError> {
    match s.carts.current(customer_id).await? {
        Some(cart) => Ok(respond(&cart)),
        None => {
            let cart = s.carts.empty_cart(customer_id);
            Ok(Json(json!({ "success": true, "cart": CartView::unsaved(&cart, Utc::now()) })))
        }
    }
}

pub async fn add_item(
    State(s): State<AppState>,
    CurrentCustomer(customer_id): CurrentCustomer,
    body: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(r) = body?;
    Ok(respond(&s.carts.add_item(customer_id, r.product_id, r.quantity).await?))
}

pub async fn update_item(
    State(s): State<AppState>,
    CurrentCustomer(customer_id): CurrentCustomer,
    Path(product_id): Path<Uuid>,
    body: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(r) = body?;
    Ok(respond(&s.carts.update_quantity(customer_id, product_id, r.quantity).await?))
}

pub async fn remove_item(
    State(s): State<AppState>,
    CurrentCustomer(customer_id): CurrentCustomer,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    Ok(respond(&s.carts.remove_item(customer_id, product_id).await?))
}
