//! Stats Repository
//!
//! The singleton stats row plus the count queries the stats service
//! and the donation estimators run.

use super::{RepoError, RepoResult};
use shared::models::{StatsRecord, StatsUpdate};
use sqlx::SqlitePool;

pub const GLOBAL_KEY: &str = "global";

const STATS_SELECT: &str = "SELECT key, donors, donations, lives, districts, target_donors, target_donations, target_lives, updated_at FROM stats";

pub async fn find_global(pool: &SqlitePool) -> RepoResult<Option<StatsRecord>> {
    let sql = format!("{STATS_SELECT} WHERE key = ?");
    let row = sqlx::query_as::<_, StatsRecord>(&sql)
        .bind(GLOBAL_KEY)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Create the global row with the given counts and default targets
pub async fn insert_global(
    pool: &SqlitePool,
    donors: i64,
    donations: i64,
    lives: i64,
    districts: i64,
    now: i64,
) -> RepoResult<StatsRecord> {
    sqlx::query(
        "INSERT OR IGNORE INTO stats (key, donors, donations, lives, districts, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(GLOBAL_KEY)
    .bind(donors)
    .bind(donations)
    .bind(lives)
    .bind(districts)
    .bind(now)
    .execute(pool)
    .await?;
    find_global(pool)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create stats row".into()))
}

/// Persist freshly computed counts, leaving targets alone
pub async fn save_counts(
    pool: &SqlitePool,
    donors: i64,
    donations: i64,
    lives: i64,
    districts: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO stats (key, donors, donations, lives, districts, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6) ON CONFLICT (key) DO UPDATE SET donors = excluded.donors, donations = excluded.donations, lives = excluded.lives, districts = excluded.districts, updated_at = excluded.updated_at",
    )
    .bind(GLOBAL_KEY)
    .bind(donors)
    .bind(donations)
    .bind(lives)
    .bind(districts)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Admin patch; creates the row when missing
pub async fn apply_update(pool: &SqlitePool, data: &StatsUpdate, now: i64) -> RepoResult<StatsRecord> {
    sqlx::query("INSERT OR IGNORE INTO stats (key, updated_at) VALUES (?1, ?2)")
        .bind(GLOBAL_KEY)
        .bind(now)
        .execute(pool)
        .await?;

    let targets = data.targets.as_ref();
    sqlx::query(
        "UPDATE stats SET donors = COALESCE(?1, donors), donations = COALESCE(?2, donations), lives = COALESCE(?3, lives), districts = COALESCE(?4, districts), target_donors = COALESCE(?5, target_donors), target_donations = COALESCE(?6, target_donations), target_lives = COALESCE(?7, target_lives), updated_at = ?8 WHERE key = ?9",
    )
    .bind(data.donors)
    .bind(data.donations)
    .bind(data.lives)
    .bind(data.districts)
    .bind(targets.and_then(|t| t.donors))
    .bind(targets.and_then(|t| t.donations))
    .bind(targets.and_then(|t| t.lives))
    .bind(now)
    .bind(GLOBAL_KEY)
    .execute(pool)
    .await?;

    find_global(pool)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to update stats row".into()))
}

async fn count(pool: &SqlitePool, sql: &str) -> RepoResult<i64> {
    let n: i64 = sqlx::query_scalar(sql).fetch_one(pool).await?;
    Ok(n)
}

// ========== Counters ==========

pub async fn count_users(pool: &SqlitePool) -> RepoResult<i64> {
    count(pool, "SELECT COUNT(*) FROM donor").await
}

/// Donors currently reachable: willing, active and verified
pub async fn count_available_donors(pool: &SqlitePool) -> RepoResult<i64> {
    count(
        pool,
        "SELECT COUNT(*) FROM donor WHERE want_to_donate = 1 AND is_active = 1 AND is_email_verified = 1",
    )
    .await
}

pub async fn count_districts(pool: &SqlitePool) -> RepoResult<i64> {
    count(pool, "SELECT COUNT(DISTINCT district) FROM donor WHERE district <> ''").await
}

pub async fn count_divisions(pool: &SqlitePool) -> RepoResult<i64> {
    count(pool, "SELECT COUNT(DISTINCT division) FROM donor WHERE division <> ''").await
}

pub async fn count_searches(pool: &SqlitePool) -> RepoResult<i64> {
    count(pool, "SELECT COUNT(*) FROM search_request").await
}

pub async fn count_donations_by_status(pool: &SqlitePool) -> RepoResult<i64> {
    count(
        pool,
        "SELECT COUNT(*) FROM donation WHERE status IN ('accepted', 'completed')",
    )
    .await
}

pub async fn count_donations_with_accepted_at(pool: &SqlitePool) -> RepoResult<i64> {
    count(pool, "SELECT COUNT(*) FROM donation WHERE accepted_at IS NOT NULL").await
}

pub async fn count_donations_with_donor(pool: &SqlitePool) -> RepoResult<i64> {
    count(pool, "SELECT COUNT(*) FROM donation WHERE donor_id IS NOT NULL").await
}

pub async fn count_completed_donations(pool: &SqlitePool) -> RepoResult<i64> {
    count(pool, "SELECT COUNT(*) FROM donation WHERE status = 'completed'").await
}

pub async fn count_accepted_donation_requests(pool: &SqlitePool) -> RepoResult<i64> {
    count(
        pool,
        "SELECT COUNT(*) FROM donation_request WHERE status = 'accepted'",
    )
    .await
}

/// Selected-list size summed over completed search requests
pub async fn sum_selected_on_completed_searches(pool: &SqlitePool) -> RepoResult<i64> {
    count(
        pool,
        "SELECT COUNT(*) FROM search_request_donor d JOIN search_request s ON s.id = d.search_request_id WHERE s.status = 'completed' AND d.list = 'selected'",
    )
    .await
}

/// Completed search requests that still carry at least one selected donor
pub async fn count_completed_searches_with_selection(pool: &SqlitePool) -> RepoResult<i64> {
    count(
        pool,
        "SELECT COUNT(DISTINCT s.id) FROM search_request s JOIN search_request_donor d ON s.id = d.search_request_id WHERE s.status = 'completed' AND d.list = 'selected'",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use shared::models::{StatsTargets, StatsTargetsPatch};

    #[tokio::test]
    async fn test_insert_global_uses_default_targets() {
        let pool = test_pool().await;
        assert!(find_global(&pool).await.unwrap().is_none());

        let record = insert_global(&pool, 1, 2, 3, 4, 10).await.unwrap();
        assert_eq!(record.key, GLOBAL_KEY);
        assert_eq!(record.targets, StatsTargets::default());
        assert_eq!(record.donations, 2);
    }

    #[tokio::test]
    async fn test_apply_update_patches_targets_per_field() {
        let pool = test_pool().await;
        let update = StatsUpdate {
            donors: Some(50),
            targets: Some(StatsTargetsPatch {
                lives: Some(42),
                ..Default::default()
            }),
            ..Default::default()
        };
        let record = apply_update(&pool, &update, 10).await.unwrap();
        assert_eq!(record.donors, 50);
        assert_eq!(record.targets.lives, 42);
        assert_eq!(record.targets.donors, StatsTargets::default().donors);

        save_counts(&pool, 1, 1, 1, 1, 20).await.unwrap();
        let record = find_global(&pool).await.unwrap().unwrap();
        assert_eq!(record.donors, 1);
        assert_eq!(record.targets.lives, 42);
    }
}
