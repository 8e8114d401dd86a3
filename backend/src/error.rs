//! Error handling for the Store Management Platform
//!
//! Provides consistent error responses in Thai and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_th: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock for product {product_name}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: Uuid,
        product_name: String,
        available: i32,
        requested: i32,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("No changes supplied")]
    NoChanges,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // Foreign-key and unique violations surface as conflicts, everything
        // else is an opaque database error
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.code().as_deref() {
                Some("23503") => {
                    return AppError::ConstraintViolation(
                        "Record is referenced by other data".to_string(),
                    )
                }
                Some("23505") => {
                    return AppError::ConstraintViolation(
                        "A record with the same value already exists".to_string(),
                    )
                }
                _ => {}
            }
        }
        AppError::DatabaseError(err)
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
    pub message_en: String,
    pub message_th: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_th,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_th: message_th.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_th: format!("ไม่พบ {}", resource),
                    field: None,
                },
            ),
            AppError::InsufficientStock {
                product_name,
                available,
                requested,
                ..
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: format!(
                        "Insufficient stock for {}: {} available, {} requested",
                        product_name, available, requested
                    ),
                    message_th: format!(
                        "สินค้า {} ไม่เพียงพอ: คงเหลือ {} ต้องการ {}",
                        product_name, available, requested
                    ),
                    field: None,
                },
            ),
            AppError::InvalidState(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_STATE".to_string(),
                    message_en: msg.clone(),
                    message_th: format!("สถานะไม่ถูกต้อง: {}", msg),
                    field: None,
                },
            ),
            AppError::InvalidStatus(status) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_STATUS".to_string(),
                    message_en: format!(
                        "Valid status is required (pending, completed, cancelled), got '{}'",
                        status
                    ),
                    message_th: format!(
                        "สถานะต้องเป็น pending, completed หรือ cancelled ไม่ใช่ '{}'",
                        status
                    ),
                    field: Some("status".to_string()),
                },
            ),
            AppError::NoChanges => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "NO_CHANGES".to_string(),
                    message_en: "No fields to update were supplied".to_string(),
                    message_th: "ไม่มีข้อมูลที่ต้องการแก้ไข".to_string(),
                    field: None,
                },
            ),
            AppError::ConstraintViolation(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONSTRAINT_VIOLATION".to_string(),
                    message_en: msg.clone(),
                    message_th: "ไม่สามารถดำเนินการได้เนื่องจากข้อมูลถูกอ้างอิงอยู่".to_string(),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_th: "เกิดข้อผิดพลาดกับฐานข้อมูล".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_th: "เกิดข้อผิดพลาดภายในเซิร์ฟเวอร์".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_th: "เกิดข้อผิดพลาดภายในเซิร์ฟเวอร์".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message_names_product() {
        let err = AppError::InsufficientStock {
            product_id: Uuid::new_v4(),
            product_name: "Fish sauce".to_string(),
            available: 2,
            requested: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("Fish sauce"));
        assert!(msg.contains('2'));
        assert!(msg.contains('5'));
    }
}
