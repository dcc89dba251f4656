//! Stats service

use shared::models::{LiveStats, StatsDebug, StatsRecord, StatsSnapshot, StatsTargets, StatsUpdate};
use sqlx::SqlitePool;

use super::estimators::estimate_donations;
use crate::db::repository::{RepoResult, stats};

const SUCCESS_BY_LEGACY: &str = "donationRequest.accepted";
const SUCCESS_BY_SEARCH: &str = "searchRequest.completed-with-selectedDonors";

/// Compute the public snapshot and persist the computed counts.
///
/// The global row is created on first use with the default targets. When
/// nothing can be counted, the stored figures are served instead, so an
/// admin-seeded value survives an empty ledger.
pub async fn get_stats(pool: &SqlitePool, include_debug: bool) -> RepoResult<StatsSnapshot> {
    let total_users = stats::count_users(pool).await?;
    let donors = total_users;
    let districts = stats::count_districts(pool).await?;
    let divisions = stats::count_divisions(pool).await?;

    let estimate = estimate_donations(pool).await;
    let mut donations = estimate.count;

    let (successful_requests, successful_method) =
        match stats::count_accepted_donation_requests(pool).await? {
            0 => (
                stats::count_completed_searches_with_selection(pool).await?,
                SUCCESS_BY_SEARCH,
            ),
            n => (n, SUCCESS_BY_LEGACY),
        };

    let mut lives = if donations > 0 { donations } else { successful_requests };

    let now = shared::util::now_millis();
    let record = match stats::find_global(pool).await? {
        Some(record) => {
            if donations == 0 {
                donations = record.donations;
            }
            if lives == 0 {
                lives = if record.lives > 0 { record.lives } else { donations };
            }
            record
        }
        None => stats::insert_global(pool, donors, donations, lives, districts, now).await?,
    };

    let searches = stats::count_searches(pool).await?;

    stats::save_counts(pool, donors, donations, lives, districts, now).await?;

    let debug = include_debug.then(|| StatsDebug {
        donations_method: estimate.method.to_string(),
        donations_count_computed: donations,
        successful_method: Some(successful_method.to_string()),
    });

    Ok(StatsSnapshot {
        total_users,
        donors,
        donations,
        lives,
        districts,
        divisions,
        searches,
        successful_requests,
        targets: record.targets,
        updated_at: record.updated_at,
        debug,
    })
}

/// Admin patch of the stored counts and targets
pub async fn update_stats(pool: &SqlitePool, patch: &StatsUpdate) -> RepoResult<StatsRecord> {
    let record = stats::apply_update(pool, patch, shared::util::now_millis()).await?;
    tracing::info!(
        donors = record.donors,
        donations = record.donations,
        lives = record.lives,
        "Stats updated by admin"
    );
    Ok(record)
}

/// Figures pushed to live subscribers
pub async fn compute_live_stats(pool: &SqlitePool) -> RepoResult<LiveStats> {
    let donors = stats::count_available_donors(pool).await?;
    let donations = stats::count_completed_donations(pool).await?;
    let districts = stats::count_districts(pool).await?;
    let targets = stats::find_global(pool)
        .await?
        .map(|r| r.targets)
        .unwrap_or_else(StatsTargets::default);

    Ok(LiveStats {
        donors,
        donations,
        lives: donations,
        districts,
        targets,
        updated_at: shared::util::now_millis(),
    })
}
