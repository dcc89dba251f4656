//! Donation Repository

use super::RepoResult;
use shared::models::Donation;
use sqlx::{Executor, Sqlite, SqlitePool};

const DONATION_SELECT: &str = "SELECT id, search_request_id, legacy_request_id, donor_id, patient_name, patient_blood_group, blood_bags_needed, requester_name, requester_phone, status, accepted_at, scheduled_at, created_at FROM donation";

pub async fn insert<'e, E>(executor: E, donation: &Donation) -> RepoResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO donation (id, search_request_id, legacy_request_id, donor_id, patient_name, patient_blood_group, blood_bags_needed, requester_name, requester_phone, status, accepted_at, scheduled_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )
    .bind(donation.id)
    .bind(donation.search_request_id)
    .bind(donation.legacy_request_id)
    .bind(donation.donor_id)
    .bind(&donation.patient_info.patient_name)
    .bind(&donation.patient_info.blood_group)
    .bind(donation.patient_info.blood_bags_needed)
    .bind(&donation.requester_name)
    .bind(&donation.requester_phone)
    .bind(donation.status)
    .bind(donation.accepted_at)
    .bind(donation.scheduled_at)
    .bind(donation.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Donation>> {
    let sql = format!("{DONATION_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Donation>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_for_donor(pool: &SqlitePool, donor_id: i64) -> RepoResult<Vec<Donation>> {
    let sql = format!("{DONATION_SELECT} WHERE donor_id = ? ORDER BY accepted_at DESC, id");
    let rows = sqlx::query_as::<_, Donation>(&sql)
        .bind(donor_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_for_search_request(
    pool: &SqlitePool,
    search_request_id: i64,
) -> RepoResult<Vec<Donation>> {
    let sql = format!("{DONATION_SELECT} WHERE search_request_id = ? ORDER BY created_at");
    let rows = sqlx::query_as::<_, Donation>(&sql)
        .bind(search_request_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
