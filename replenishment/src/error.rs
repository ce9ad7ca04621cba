//! Error taxonomy for the replenishment engine, mapped from spec §7.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i64,
        available: i64,
    },

    #[error("batch {batch_id} not found")]
    BatchNotFound { batch_id: Uuid },

    #[error("batch {batch_id} belongs to a different store")]
    StoreMismatch { batch_id: Uuid },

    #[error("sale {sale_id} was already refunded")]
    AlreadyRefunded { sale_id: Uuid },

    #[error("no eligible suggestions for approval")]
    NoEligibleSuggestions,

    #[error("suggestions changed concurrently: {ids:?}")]
    ConcurrentModification { ids: Vec<Uuid> },

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } | Error::BatchNotFound { .. } => StatusCode::NOT_FOUND,
            Error::InsufficientStock { .. } => StatusCode::CONFLICT,
            Error::StoreMismatch { .. } => StatusCode::BAD_REQUEST,
            Error::AlreadyRefunded { .. } => StatusCode::CONFLICT,
            Error::NoEligibleSuggestions => StatusCode::CONFLICT,
            Error::ConcurrentModification { .. } => StatusCode::CONFLICT,
            Error::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Database(_) | Error::Serialization(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code, independent of the (potentially parameterized) message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::NotFound { .. } => "not_found",
            Error::InsufficientStock { .. } => "insufficient_stock",
            Error::BatchNotFound { .. } => "batch_not_found",
            Error::StoreMismatch { .. } => "store_mismatch",
            Error::AlreadyRefunded { .. } => "already_refunded",
            Error::NoEligibleSuggestions => "no_eligible_suggestions",
            Error::ConcurrentModification { .. } => "concurrent_modification",
            Error::DependencyUnavailable(_) => "dependency_unavailable",
            Error::Database(_) => "database_error",
            Error::Serialization(_) => "serialization_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::warn!(error_code = self.code(), "request failed: {}", self);
        let body = ErrorBody { error: self.code(), message: self.to_string() };
        (self.status_code(), Json(body)).into_response()
    }
}
