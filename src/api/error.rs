//! Error responses: `{success: false, message}`.

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use tracing::error;

use crate::domain::aggregates::{CartError, InventoryError, OrderError};
use crate::domain::services::UnavailableItem;
use crate::StorefrontError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub unavailable_items: Option<Vec<UnavailableItem>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), unavailable_items: None }
    }

    /// Replaces the generic message of a 500 with an endpoint-specific one.
    pub fn or_internal(mut self, message: &str) -> Self {
        if self.status == StatusCode::INTERNAL_SERVER_ERROR { self.message = message.to_string(); }
        self
    }
}

impl From<StorefrontError> for ApiError {
    fn from(e: StorefrontError) -> Self {
        use StorefrontError::*;
        let status = match &e {
            Unauthenticated => StatusCode::UNAUTHORIZED,
            CustomerNotFound | CartNotFound | OrderNotFound | ProductNotFound | StoreNotFound => StatusCode::NOT_FOUND,
            EmptyCart | IncompleteAddress | InvalidPhone | StockUnavailable(_) => StatusCode::BAD_REQUEST,
            Cart(CartError::ItemNotFound) | Order(OrderError::ItemNotFound) => StatusCode::NOT_FOUND,
            Cart(_) | Order(OrderError::NoItems) | Inventory(InventoryError::InvalidQuantity | InventoryError::MissingName) => StatusCode::BAD_REQUEST,
            Order(OrderError::InvalidTransition { .. }) | Inventory(InventoryError::InsufficientStock { .. }) => StatusCode::CONFLICT,
            Inventory(InventoryError::Inconsistent) | OrderNumberExhausted(_) | CorruptRecord(_) | Storage(_) | Database(_) | Migration(_) | Document(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %e, "request failed");
            return Self::new(status, "Internal server error");
        }
        match e {
            StockUnavailable(items) => Self { status, message: "Some items are unavailable".into(), unavailable_items: Some(items) },
            other => Self::new(status, other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self { Self::new(StatusCode::BAD_REQUEST, rejection.body_text()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "success": false, "message": self.message });
        if let Some(items) = self.unavailable_items { body["unavailableItems"] = json!(items); }
        (self.status, Json(body)).into_response()
    }
}
