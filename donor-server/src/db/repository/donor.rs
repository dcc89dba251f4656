//! Donor Repository

use super::{RepoError, RepoResult};
use shared::models::{Donor, DonorCreate, DonorRole};
use sqlx::{Executor, Sqlite, SqlitePool};

const DONOR_SELECT: &str = "SELECT id, name, email, phone, blood_group, division, district, upazila, area, want_to_donate, disabled_until, is_active, is_email_verified, role, created_at, updated_at FROM donor";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Donor>> {
    let sql = format!("{DONOR_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Donor>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Donor with the embedded history loaded
pub async fn find_with_history(pool: &SqlitePool, id: i64) -> RepoResult<Option<Donor>> {
    let Some(mut donor) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    donor.donation_history = super::history::list_for_donor(pool, id).await?;
    Ok(Some(donor))
}

pub async fn exists<'e, E>(executor: E, id: i64) -> RepoResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM donor WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(found.is_some())
}

pub async fn create(pool: &SqlitePool, data: DonorCreate) -> RepoResult<Donor> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let result = sqlx::query(
        "INSERT INTO donor (id, name, email, phone, blood_group, division, district, upazila, area, want_to_donate, is_active, is_email_verified, role, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, 0, ?11, ?12, ?12)",
    )
    .bind(id)
    .bind(data.name.trim())
    .bind(data.email.trim().to_lowercase())
    .bind(&data.phone)
    .bind(data.blood_group.trim())
    .bind(data.division.trim())
    .bind(data.district.trim())
    .bind(data.upazila.trim())
    .bind(data.area.trim())
    .bind(data.want_to_donate.unwrap_or(true))
    .bind(DonorRole::Donor)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(e) => {
            return Err(match RepoError::from(e) {
                RepoError::Duplicate(_) => {
                    RepoError::Duplicate(format!("Email {} is already registered", data.email))
                }
                other => other,
            });
        }
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create donor".into()))
}

/// Write the availability pair in one targeted update
pub async fn set_availability<'e, E>(
    executor: E,
    id: i64,
    want_to_donate: bool,
    disabled_until: Option<i64>,
    now: i64,
) -> RepoResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "UPDATE donor SET want_to_donate = ?1, disabled_until = ?2, updated_at = ?3 WHERE id = ?4",
    )
    .bind(want_to_donate)
    .bind(disabled_until)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Donor {id} not found")));
    }
    Ok(())
}

/// Re-enable every donor whose cooldown has elapsed; returns the number restored
pub async fn reenable_expired(pool: &SqlitePool, now: i64) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE donor SET want_to_donate = 1, disabled_until = NULL, updated_at = ?1 WHERE disabled_until IS NOT NULL AND disabled_until <= ?1 AND want_to_donate = 0",
    )
    .bind(now)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

/// Mark a donor as admin (operator tooling and tests)
pub async fn set_role(pool: &SqlitePool, id: i64, role: DonorRole) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE donor SET role = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(role)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Donor {id} not found")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn sample(email: &str) -> DonorCreate {
        DonorCreate {
            name: "Karim".into(),
            email: email.into(),
            phone: Some("01700000000".into()),
            blood_group: "O+".into(),
            division: "Dhaka".into(),
            district: "Dhaka".into(),
            upazila: String::new(),
            area: String::new(),
            want_to_donate: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = test_pool().await;
        let donor = create(&pool, sample("Karim@Example.com")).await.unwrap();
        assert_eq!(donor.email, "karim@example.com");
        assert!(donor.want_to_donate);
        assert_eq!(donor.disabled_until, None);
        assert_eq!(donor.role, DonorRole::Donor);

        let found = find_with_history(&pool, donor.id).await.unwrap().unwrap();
        assert!(found.donation_history.is_empty());
        assert!(exists(&pool, donor.id).await.unwrap());
        assert!(!exists(&pool, donor.id + 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let pool = test_pool().await;
        create(&pool, sample("a@example.com")).await.unwrap();
        let err = create(&pool, sample("A@example.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_set_availability_missing_donor() {
        let pool = test_pool().await;
        let err = set_availability(&pool, 42, false, None, 0).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reenable_expired_only_touches_elapsed() {
        let pool = test_pool().await;
        let due = create(&pool, sample("due@example.com")).await.unwrap();
        let later = create(&pool, sample("later@example.com")).await.unwrap();
        let indefinite = create(&pool, sample("off@example.com")).await.unwrap();

        set_availability(&pool, due.id, false, Some(1_000), 0).await.unwrap();
        set_availability(&pool, later.id, false, Some(5_000), 0).await.unwrap();
        set_availability(&pool, indefinite.id, false, None, 0).await.unwrap();

        assert_eq!(reenable_expired(&pool, 2_000).await.unwrap(), 1);
        assert_eq!(reenable_expired(&pool, 2_000).await.unwrap(), 0);

        let due = find_by_id(&pool, due.id).await.unwrap().unwrap();
        assert!(due.want_to_donate);
        assert_eq!(due.disabled_until, None);

        let later = find_by_id(&pool, later.id).await.unwrap().unwrap();
        assert!(!later.want_to_donate);

        let indefinite = find_by_id(&pool, indefinite.id).await.unwrap().unwrap();
        assert!(!indefinite.want_to_donate);
    }
}
