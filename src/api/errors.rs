use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use super::response::ApiResponse;
use crate::domain::order::OrderError;
use crate::store::StoreError;

// ============================================================================
// API Errors - mapped onto the JSON error envelope
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request payload")]
    InvalidPayload,

    #[error("Invalid order identifier provided")]
    UnknownIdentifier,

    #[error("Invalid order status provided")]
    InvalidStatus,

    #[error("{0}")]
    Validation(OrderError),

    #[error("{0}")]
    Store(StoreError),
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::UnknownStatus(_) => ApiError::InvalidStatus,
            other => ApiError::Validation(other),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::UnknownIdentifier,
            other => ApiError::Store(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload
            | ApiError::UnknownIdentifier
            | ApiError::InvalidStatus
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        ApiResponse::error(status, self.to_string()).into_response()
    }
}
