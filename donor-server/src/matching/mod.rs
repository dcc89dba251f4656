//! Donation matching and donor availability
//!
//! - [`availability`] - the per-donor `wantToDonate` / `disabledUntil` pair
//! - [`search`] - search request aggregate: create, selection, decline, reject, reset
//! - [`acceptance`] - the acceptance transaction for both request kinds
//! - [`history`] - unified donation history (ledger + embedded entries)
//! - [`sweep`] - daily re-enable sweep

pub mod acceptance;
pub mod availability;
pub mod history;
pub mod search;
pub mod sweep;

pub use acceptance::{AcceptancePolicy, LegacyAcceptance, SearchAcceptance};
pub use availability::Cooldown;
pub use search::Removal;

use shared::error::ErrorCode;
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::utils::AppError;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Donor {0} not found")]
    DonorNotFound(i64),

    #[error("Search request {0} not found")]
    SearchRequestNotFound(i64),

    #[error("Donation request {0} not found")]
    DonationRequestNotFound(i64),

    #[error("Donor {donor_id} is not selected for search request {request_id}")]
    NotSelected { request_id: i64, donor_id: i64 },

    #[error("Donation request {0} is not pending")]
    NotPending(i64),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for MatchError {
    fn from(err: sqlx::Error) -> Self {
        MatchError::Repo(err.into())
    }
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        let message = err.to_string();
        match err {
            MatchError::DonorNotFound(id) => {
                AppError::with_message(ErrorCode::DonorNotFound, message).with_detail("donorId", id)
            }
            MatchError::SearchRequestNotFound(id) => {
                AppError::with_message(ErrorCode::SearchRequestNotFound, message)
                    .with_detail("searchRequestId", id)
            }
            MatchError::DonationRequestNotFound(id) => {
                AppError::with_message(ErrorCode::DonationRequestNotFound, message)
                    .with_detail("requestId", id)
            }
            MatchError::NotSelected { .. } => {
                AppError::with_message(ErrorCode::DonorNotSelected, message)
            }
            MatchError::NotPending(_) => AppError::with_message(ErrorCode::RequestNotPending, message),
            MatchError::Unauthorized(msg) => AppError::permission_denied(msg),
            MatchError::Validation(msg) => AppError::validation(msg),
            MatchError::Timeout(_) => AppError::timeout(message),
            MatchError::Repo(e) => e.into(),
        }
    }
}

/// Run `fut` under the operation timeout. Dropping a pending transaction
/// rolls it back.
pub(crate) async fn bounded<T, F>(
    limit: std::time::Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, MatchError>
where
    F: std::future::Future<Output = Result<T, MatchError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "Operation timed out");
            Err(MatchError::Timeout(operation))
        }
    }
}
