//! Error handling for the Production Operations Tracking Platform
//!
//! All business failures are distinct, inspectable values; storage errors
//! propagate unchanged rather than being reinterpreted as business failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Write access required")]
    ReadOnlyAccess,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    // Business logic errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Insufficient inventory in lot {lot_id}: requested {requested}, available {available}")]
    InsufficientInventory {
        lot_id: Uuid,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Batch is already approved and locked")]
    AlreadyLocked,

    #[error("Locked batches cannot be deleted")]
    BatchLocked,

    #[error("Concurrent modification detected; retry the operation")]
    ConcurrentModification,

    #[error("Conflict: {0}")]
    Conflict(String),

    // Infrastructure errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shortfall carried by an insufficient-inventory failure
    pub fn shortfall(&self) -> Option<Decimal> {
        match self {
            AppError::InsufficientInventory {
                requested,
                available,
                ..
            } => Some(requested - available),
            _ => None,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "INVALID_TOKEN".to_string(),
                    message: "Invalid or missing token".to_string(),
                    field: None,
                },
            ),
            AppError::ReadOnlyAccess => (
                StatusCode::FORBIDDEN,
                ErrorDetail {
                    code: "READ_ONLY_ACCESS".to_string(),
                    message: "This action requires read-write access".to_string(),
                    field: None,
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::InsufficientInventory {
                lot_id,
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_INVENTORY".to_string(),
                    message: format!(
                        "Lot {} has {} available, requested {} (shortfall {})",
                        lot_id,
                        available,
                        requested,
                        requested - available
                    ),
                    field: None,
                },
            ),
            AppError::AlreadyLocked => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "ALREADY_LOCKED".to_string(),
                    message: "Batch is already approved and locked".to_string(),
                    field: None,
                },
            ),
            AppError::BatchLocked => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "BATCH_LOCKED".to_string(),
                    message: "Locked batches cannot be deleted".to_string(),
                    field: None,
                },
            ),
            AppError::ConcurrentModification => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONCURRENT_MODIFICATION".to_string(),
                    message: "The record changed during the operation; retry from scratch"
                        .to_string(),
                    field: None,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message: format!("Configuration error: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
        };

        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
