//! Donation Request Repository (legacy single-assignee requests)

use super::{RepoError, RepoResult};
use shared::models::{DonationRequest, PatientInfo, RequestStatus};
use sqlx::{Executor, Sqlite, SqlitePool};

const REQUEST_SELECT: &str = "SELECT id, donor_id, requester_name, requester_phone, patient_name, patient_blood_group, blood_bags_needed, status, accepted_at, created_at FROM donation_request";

pub async fn create(
    pool: &SqlitePool,
    donor_id: i64,
    requester_name: &str,
    requester_phone: Option<&str>,
    patient_info: &PatientInfo,
) -> RepoResult<DonationRequest> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO donation_request (id, donor_id, requester_name, requester_phone, patient_name, patient_blood_group, blood_bags_needed, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(id)
    .bind(donor_id)
    .bind(requester_name)
    .bind(requester_phone)
    .bind(&patient_info.patient_name)
    .bind(&patient_info.blood_group)
    .bind(patient_info.blood_bags_needed)
    .bind(RequestStatus::Pending)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create donation request".into()))
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> RepoResult<Option<DonationRequest>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{REQUEST_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, DonationRequest>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

/// Requests assigned to a donor, newest first
pub async fn list_for_donor(pool: &SqlitePool, donor_id: i64) -> RepoResult<Vec<DonationRequest>> {
    let sql = format!("{REQUEST_SELECT} WHERE donor_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, DonationRequest>(&sql)
        .bind(donor_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// `pending -> accepted`; false when the request is no longer pending
pub async fn mark_accepted<'e, E>(executor: E, id: i64, now: i64) -> RepoResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "UPDATE donation_request SET status = ?1, accepted_at = ?2 WHERE id = ?3 AND status = ?4",
    )
    .bind(RequestStatus::Accepted)
    .bind(now)
    .bind(id)
    .bind(RequestStatus::Pending)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_mark_accepted_only_once() {
        let pool = test_pool().await;
        let request = create(&pool, 7, "Rahim", None, &PatientInfo::default())
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);

        assert!(mark_accepted(&pool, request.id, 10).await.unwrap());
        assert!(!mark_accepted(&pool, request.id, 20).await.unwrap());

        let stored = find_by_id(&pool, request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Accepted);
        assert_eq!(stored.accepted_at, Some(10));
        assert_eq!(list_for_donor(&pool, 7).await.unwrap().len(), 1);
    }
}
