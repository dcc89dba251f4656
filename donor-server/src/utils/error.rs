//! Error handling
//!
//! Re-exports the unified error types from `shared::error` and adds the
//! response helpers handlers use.

use axum::Json;
use serde::Serialize;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Wrap data in a success response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Wrap data in a success response with a custom message
pub fn ok_with_message<T: Serialize>(message: impl Into<String>, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success_with_message(message, data))
}
