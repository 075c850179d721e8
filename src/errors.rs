//! Error taxonomy for the storefront
//!
//! The cart/wishlist engine itself never fails: missing ids and non-positive
//! quantities are resolved by policy. Errors only arise at the edges
//! (catalog lookups, checkout validation, configuration, I/O).

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::checkout::CheckoutStep;
use crate::store::models::ProductId;

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Product {0} not found in catalog")]
    ProductNotFound(ProductId),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Checkout cannot {action} from the {step:?} step")]
    InvalidStep {
        action: &'static str,
        step: CheckoutStep,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, StorefrontError>;

impl StorefrontError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StorefrontError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            StorefrontError::EmptyCart
            | StorefrontError::MissingField(_)
            | StorefrontError::InvalidStep { .. } => StatusCode::BAD_REQUEST,
            StorefrontError::Config(_) | StorefrontError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
