//! API error type.
//!
//! Every handler returns `Result<T, ApiError>`. Errors render as
//! `{ "error": "<message>" }`, with a `fields` map for validation failures.
//! Server errors are logged and their details are not sent to the client.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::aggregates::{OrderError, ProductError, UserError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(what: &str) -> Self { Self::NotFound(format!("{what} not found")) }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Field name -> first message, in field order.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            let first = errs.first()?;
            let message = first.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| format!("{field} is invalid"));
            Some((field.to_string(), message))
        })
        .collect()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(errors) => {
                let fields = field_messages(errors);
                let summary = fields.values().next().cloned().unwrap_or_else(|| self.to_string());
                json!({ "error": summary, "fields": fields })
            }
            Self::Store(StoreError::NotFound(what)) => json!({ "error": format!("{what} not found") }),
            Self::Store(StoreError::Conflict(what)) => json!({ "error": format!("{what} already exists") }),
            Self::Store(_) => {
                tracing::error!(error = %self, "request failed");
                json!({ "error": "Internal server error" })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ProductError> for ApiError {
    fn from(e: ProductError) -> Self { Self::BadRequest(e.to_string()) }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::AddressLimit => Self::BadRequest(e.to_string()),
            UserError::AddressNotFound | UserError::NotInWishlist => Self::NotFound(e.to_string()),
            UserError::AlreadyInWishlist => Self::Conflict(e.to_string()),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NoItems | OrderError::InvalidQuantity(_) | OrderError::TotalMismatch { .. } => Self::BadRequest(e.to_string()),
            OrderError::PaymentTransition { .. } | OrderError::StatusTransition { .. } | OrderError::PaymentOutstanding => {
                Self::Conflict(e.to_string())
            }
        }
    }
}
