//! Unified error system
//!
//! - [`ErrorCode`]: standardized error codes
//! - [`ErrorCategory`]: classification of errors by domain
//! - [`AppError`]: error type with code, message and details
//! - [`ApiResponse`]: unified API response format
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Donor errors
//! - 4xxx: Request (search / donation request) errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::DonorNotSelected);
//! let err = AppError::validation("bloodBagsNeeded must be positive")
//!     .with_detail("field", "bloodBagsNeeded");
//! let response = ApiResponse::<()>::error(&err);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
