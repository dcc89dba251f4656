//! Donor History Repository
//!
//! Append-only; entries come back in insertion order.

use super::RepoResult;
use shared::models::HistoryEntry;
use sqlx::{Executor, Sqlite};

pub async fn append<'e, E>(executor: E, donor_id: i64, entry: &HistoryEntry) -> RepoResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO donor_history (id, donor_id, request_id, patient_name, patient_blood_group, blood_bags_needed, requester_name, requester_phone, accepted_at, scheduled_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(entry.id)
    .bind(donor_id)
    .bind(&entry.request_id)
    .bind(&entry.patient_info.patient_name)
    .bind(&entry.patient_info.blood_group)
    .bind(entry.patient_info.blood_bags_needed)
    .bind(&entry.requester_name)
    .bind(&entry.requester_phone)
    .bind(entry.accepted_at)
    .bind(entry.scheduled_at)
    .bind(entry.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_for_donor<'e, E>(executor: E, donor_id: i64) -> RepoResult<Vec<HistoryEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, HistoryEntry>(
        "SELECT id, request_id, patient_name, patient_blood_group, blood_bags_needed, requester_name, requester_phone, accepted_at, scheduled_at, created_at FROM donor_history WHERE donor_id = ? ORDER BY seq",
    )
    .bind(donor_id)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}
