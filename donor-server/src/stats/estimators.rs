//! Donation count estimators
//!
//! Depending on which flows a deployment has used, donations show up in
//! different places. The estimators are tried in order and the first one
//! reporting a positive count wins.

use sqlx::SqlitePool;

use crate::db::repository::{RepoResult, stats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonationEstimator {
    /// Donations with status accepted or completed
    DonationStatus,
    /// Donations carrying an acceptance time
    DonationAcceptedAt,
    /// Donations with a donor
    DonationDonor,
    /// Legacy requests that were accepted
    DonationRequestAccepted,
    /// Selected donors summed over completed search requests
    SearchSelectedSum,
}

impl DonationEstimator {
    pub const CHAIN: [DonationEstimator; 5] = [
        DonationEstimator::DonationStatus,
        DonationEstimator::DonationAcceptedAt,
        DonationEstimator::DonationDonor,
        DonationEstimator::DonationRequestAccepted,
        DonationEstimator::SearchSelectedSum,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DonationStatus => "donation.status(accepted|completed)",
            Self::DonationAcceptedAt => "donation.acceptedAt",
            Self::DonationDonor => "donation.donorId",
            Self::DonationRequestAccepted => "donationRequest.accepted",
            Self::SearchSelectedSum => "searchRequest.selectedDonorsSum",
        }
    }

    pub async fn count(&self, pool: &SqlitePool) -> RepoResult<i64> {
        match self {
            Self::DonationStatus => stats::count_donations_by_status(pool).await,
            Self::DonationAcceptedAt => stats::count_donations_with_accepted_at(pool).await,
            Self::DonationDonor => stats::count_donations_with_donor(pool).await,
            Self::DonationRequestAccepted => stats::count_accepted_donation_requests(pool).await,
            Self::SearchSelectedSum => stats::sum_selected_on_completed_searches(pool).await,
        }
    }

    /// A count only settles the estimate when it is positive
    pub fn applies(count: i64) -> bool {
        count > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonationEstimate {
    pub count: i64,
    pub method: &'static str,
}

pub const NO_MATCH: &str = "no-match";

/// Walk the chain; an estimator that errors is skipped
pub async fn estimate_donations(pool: &SqlitePool) -> DonationEstimate {
    for estimator in DonationEstimator::CHAIN {
        match estimator.count(pool).await {
            Ok(count) if DonationEstimator::applies(count) => {
                return DonationEstimate {
                    count,
                    method: estimator.name(),
                };
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(estimator = estimator.name(), error = %e, "Donation estimator failed");
            }
        }
    }
    DonationEstimate {
        count: 0,
        method: NO_MATCH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_empty_database_has_no_match() {
        let pool = test_pool().await;
        let estimate = estimate_donations(&pool).await;
        assert_eq!(estimate.count, 0);
        assert_eq!(estimate.method, NO_MATCH);
    }

    #[tokio::test]
    async fn test_falls_through_to_legacy_requests() {
        let pool = test_pool().await;
        sqlx::query(
            "INSERT INTO donation_request (id, donor_id, requester_name, status, created_at) VALUES (1, 1, 'R', 'accepted', 0), (2, 1, 'R', 'pending', 0)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let estimate = estimate_donations(&pool).await;
        assert_eq!(estimate.count, 1);
        assert_eq!(estimate.method, "donationRequest.accepted");
    }

    #[tokio::test]
    async fn test_donation_status_wins_first() {
        let pool = test_pool().await;
        sqlx::query(
            "INSERT INTO donation (id, donor_id, status, accepted_at) VALUES (1, 1, 'accepted', 5), (2, 2, 'cancelled', 6)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO donation_request (id, donor_id, requester_name, status, created_at) VALUES (1, 1, 'R', 'accepted', 0)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let estimate = estimate_donations(&pool).await;
        assert_eq!(estimate.count, 1);
        assert_eq!(estimate.method, "donation.status(accepted|completed)");
    }

    #[tokio::test]
    async fn test_cancelled_donations_fall_to_accepted_at() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO donation (id, donor_id, status, accepted_at) VALUES (1, 1, 'cancelled', 5)")
            .execute(&pool)
            .await
            .unwrap();

        let estimate = estimate_donations(&pool).await;
        assert_eq!(estimate.count, 1);
        assert_eq!(estimate.method, "donation.acceptedAt");
    }
}
