//! Search Request Repository
//!
//! The aggregate row lives in `search_request`; its candidate and selected
//! donor lists live in `search_request_donor`, one row per membership with
//! an explicit position so list order survives round trips.

use super::{RepoError, RepoResult};
use shared::models::{DonorRef, RequestStatus, SearchRequest, SelectionPatch};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};

const SEARCH_REQUEST_SELECT: &str = "SELECT id, browser_id, patient_name, patient_blood_group, blood_bags_needed, filter_blood_group, filter_division, filter_district, filter_upazila, filter_area, requester_name, requester_phone, status, accepted_donor, search_date, matched_at, cancelled_at, created_at, updated_at FROM search_request";

/// Which donor list of the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonorList {
    Found,
    Selected,
}

impl DonorList {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::Selected => "selected",
        }
    }
}

async fn load_lists(conn: &mut SqliteConnection, request: &mut SearchRequest) -> RepoResult<()> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT list, donor_id FROM search_request_donor WHERE search_request_id = ? ORDER BY list, position",
    )
    .bind(request.id)
    .fetch_all(&mut *conn)
    .await?;

    request.found_donors.clear();
    request.selected_donors.clear();
    for (list, donor_id) in rows {
        match list.as_str() {
            "found" => request.found_donors.push(DonorRef(donor_id)),
            "selected" => request.selected_donors.push(DonorRef(donor_id)),
            other => {
                return Err(RepoError::Database(format!(
                    "Unknown donor list '{other}' on search request {}",
                    request.id
                )));
            }
        }
    }
    Ok(())
}

async fn fetch_many(conn: &mut SqliteConnection, sql: &str, bind: Option<BindArg<'_>>) -> RepoResult<Vec<SearchRequest>> {
    let query = sqlx::query_as::<_, SearchRequest>(sql);
    let query = match bind {
        Some(BindArg::Int(v)) => query.bind(v),
        Some(BindArg::Text(v)) => query.bind(v),
        None => query,
    };
    let mut rows = query.fetch_all(&mut *conn).await?;
    for row in &mut rows {
        load_lists(conn, row).await?;
    }
    Ok(rows)
}

enum BindArg<'a> {
    Int(i64),
    Text(&'a str),
}

/// Load one aggregate with both lists on the given connection
pub async fn fetch(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<SearchRequest>> {
    let sql = format!("{SEARCH_REQUEST_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, SearchRequest>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(mut request) => {
            load_lists(conn, &mut request).await?;
            Ok(Some(request))
        }
        None => Ok(None),
    }
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<SearchRequest>> {
    let mut conn = pool.acquire().await?;
    fetch(&mut conn, id).await
}

/// Insert the aggregate row and both lists
pub async fn insert(conn: &mut SqliteConnection, request: &SearchRequest) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO search_request (id, browser_id, patient_name, patient_blood_group, blood_bags_needed, filter_blood_group, filter_division, filter_district, filter_upazila, filter_area, requester_name, requester_phone, status, accepted_donor, search_date, matched_at, cancelled_at, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
    )
    .bind(request.id)
    .bind(&request.browser_id)
    .bind(&request.patient_info.patient_name)
    .bind(&request.patient_info.blood_group)
    .bind(request.patient_info.blood_bags_needed)
    .bind(&request.filters.blood_group)
    .bind(&request.filters.division)
    .bind(&request.filters.district)
    .bind(&request.filters.upazila)
    .bind(&request.filters.area)
    .bind(&request.requester_name)
    .bind(&request.requester_phone)
    .bind(request.status)
    .bind(request.accepted_donor)
    .bind(request.search_date)
    .bind(request.matched_at)
    .bind(request.cancelled_at)
    .bind(request.created_at)
    .bind(request.updated_at)
    .execute(&mut *conn)
    .await?;

    replace_list(conn, request.id, DonorList::Found, &request.found_donors).await?;
    replace_list(conn, request.id, DonorList::Selected, &request.selected_donors).await?;
    Ok(())
}

/// Replace one list wholesale. `donors` must already be deduplicated.
pub async fn replace_list(
    conn: &mut SqliteConnection,
    id: i64,
    list: DonorList,
    donors: &[DonorRef],
) -> RepoResult<()> {
    sqlx::query("DELETE FROM search_request_donor WHERE search_request_id = ? AND list = ?")
        .bind(id)
        .bind(list.as_str())
        .execute(&mut *conn)
        .await?;

    for (position, donor) in donors.iter().enumerate() {
        sqlx::query(
            "INSERT INTO search_request_donor (search_request_id, list, donor_id, position) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id)
        .bind(list.as_str())
        .bind(donor.id())
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Apply the scalar part of a patch; omitted fields keep their value
pub async fn update_fields(
    conn: &mut SqliteConnection,
    id: i64,
    patch: &SelectionPatch,
    now: i64,
) -> RepoResult<()> {
    let patient = patch.patient_info.as_ref();
    let filters = patch.filters.as_ref();
    let rows = sqlx::query(
        "UPDATE search_request SET patient_name = COALESCE(?1, patient_name), patient_blood_group = COALESCE(?2, patient_blood_group), blood_bags_needed = COALESCE(?3, blood_bags_needed), filter_blood_group = COALESCE(?4, filter_blood_group), filter_division = COALESCE(?5, filter_division), filter_district = COALESCE(?6, filter_district), filter_upazila = COALESCE(?7, filter_upazila), filter_area = COALESCE(?8, filter_area), status = COALESCE(?9, status), cancelled_at = COALESCE(?10, cancelled_at), updated_at = ?11 WHERE id = ?12",
    )
    .bind(patient.map(|p| p.patient_name.as_str()))
    .bind(patient.map(|p| p.blood_group.as_str()))
    .bind(patient.map(|p| p.blood_bags_needed))
    .bind(filters.map(|f| f.blood_group.as_str()))
    .bind(filters.map(|f| f.division.as_str()))
    .bind(filters.map(|f| f.district.as_str()))
    .bind(filters.map(|f| f.upazila.as_str()))
    .bind(filters.map(|f| f.area.as_str()))
    .bind(patch.status)
    .bind(patch.cancelled_at)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Search request {id} not found")));
    }
    Ok(())
}

/// Clear patient info, filters and both lists; status becomes `reset`
pub async fn clear(conn: &mut SqliteConnection, id: i64, now: i64) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE search_request SET patient_name = '', patient_blood_group = '', blood_bags_needed = 1, filter_blood_group = '', filter_division = '', filter_district = '', filter_upazila = '', filter_area = '', status = ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(RequestStatus::Reset)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Search request {id} not found")));
    }

    sqlx::query("DELETE FROM search_request_donor WHERE search_request_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Remove a donor from the selected list; returns rows removed (0 or 1).
///
/// Acceptance uses this as its compare-and-swap: only one caller can
/// observe a removal for a given aggregate and donor.
pub async fn remove_selected<'e, E>(executor: E, id: i64, donor_id: i64) -> RepoResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "DELETE FROM search_request_donor WHERE search_request_id = ?1 AND list = 'selected' AND donor_id = ?2",
    )
    .bind(id)
    .bind(donor_id)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected())
}

/// Number of donors left in (found, selected)
pub async fn count_members(conn: &mut SqliteConnection, id: i64) -> RepoResult<(i64, i64)> {
    let counts: (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(list = 'found'), 0), COALESCE(SUM(list = 'selected'), 0) FROM search_request_donor WHERE search_request_id = ?",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(counts)
}

pub async fn set_status<'e, E>(executor: E, id: i64, status: RequestStatus, now: i64) -> RepoResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query("UPDATE search_request SET status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Search request {id} not found")));
    }
    Ok(())
}

/// Bump `updated_at`; NotFound when the aggregate is missing
pub async fn touch<'e, E>(executor: E, id: i64, now: i64) -> RepoResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query("UPDATE search_request SET updated_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Search request {id} not found")));
    }
    Ok(())
}

/// Record the accepting donor and move to `matched`
pub async fn mark_matched<'e, E>(executor: E, id: i64, donor_id: i64, now: i64) -> RepoResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "UPDATE search_request SET accepted_donor = ?1, status = ?2, matched_at = ?3, updated_at = ?3 WHERE id = ?4",
    )
    .bind(donor_id)
    .bind(RequestStatus::Matched)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Search request {id} not found")));
    }
    Ok(())
}

/// Most recent aggregate by search date
pub async fn latest(pool: &SqlitePool) -> RepoResult<Option<SearchRequest>> {
    let mut conn = pool.acquire().await?;
    let sql = format!("{SEARCH_REQUEST_SELECT} ORDER BY search_date DESC, created_at DESC LIMIT 1");
    Ok(fetch_many(&mut conn, &sql, None).await?.into_iter().next())
}

pub async fn latest_for_browser(pool: &SqlitePool, browser_id: &str) -> RepoResult<Option<SearchRequest>> {
    let mut conn = pool.acquire().await?;
    let sql = format!(
        "{SEARCH_REQUEST_SELECT} WHERE browser_id = ? ORDER BY search_date DESC, created_at DESC LIMIT 1"
    );
    Ok(fetch_many(&mut conn, &sql, Some(BindArg::Text(browser_id)))
        .await?
        .into_iter()
        .next())
}

/// Aggregates that currently have the donor selected, newest first
pub async fn list_for_donor(pool: &SqlitePool, donor_id: i64) -> RepoResult<Vec<SearchRequest>> {
    let mut conn = pool.acquire().await?;
    let sql = format!(
        "{SEARCH_REQUEST_SELECT} WHERE id IN (SELECT search_request_id FROM search_request_donor WHERE list = 'selected' AND donor_id = ?) ORDER BY created_at DESC"
    );
    fetch_many(&mut conn, &sql, Some(BindArg::Int(donor_id))).await
}

pub async fn latest_for_donor(pool: &SqlitePool, donor_id: i64) -> RepoResult<Option<SearchRequest>> {
    let mut conn = pool.acquire().await?;
    let sql = format!(
        "{SEARCH_REQUEST_SELECT} WHERE id IN (SELECT search_request_id FROM search_request_donor WHERE list = 'selected' AND donor_id = ?) ORDER BY created_at DESC LIMIT 1"
    );
    Ok(fetch_many(&mut conn, &sql, Some(BindArg::Int(donor_id)))
        .await?
        .into_iter()
        .next())
}

pub async fn list_all(pool: &SqlitePool) -> RepoResult<Vec<SearchRequest>> {
    let mut conn = pool.acquire().await?;
    let sql = format!("{SEARCH_REQUEST_SELECT} ORDER BY search_date DESC, created_at DESC");
    fetch_many(&mut conn, &sql, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use shared::models::{PatientInfo, SearchFilters};

    fn request(id: i64, search_date: i64) -> SearchRequest {
        SearchRequest {
            id,
            browser_id: Some("browser-1".into()),
            patient_info: PatientInfo {
                patient_name: "Rahim".into(),
                blood_group: "A+".into(),
                blood_bags_needed: 2,
            },
            filters: SearchFilters::default(),
            requester_name: "Nadia".into(),
            requester_phone: "01800000000".into(),
            found_donors: vec![DonorRef(3), DonorRef(1), DonorRef(2)],
            selected_donors: vec![DonorRef(2), DonorRef(1)],
            status: RequestStatus::Active,
            accepted_donor: None,
            search_date,
            matched_at: None,
            cancelled_at: None,
            created_at: search_date,
            updated_at: search_date,
        }
    }

    #[tokio::test]
    async fn test_insert_preserves_list_order() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        insert(&mut conn, &request(1, 100)).await.unwrap();
        drop(conn);

        let stored = find_by_id(&pool, 1).await.unwrap().unwrap();
        assert_eq!(stored.found_donors, vec![DonorRef(3), DonorRef(1), DonorRef(2)]);
        assert_eq!(stored.selected_donors, vec![DonorRef(2), DonorRef(1)]);
        assert_eq!(stored.patient_info.blood_bags_needed, 2);
    }

    #[tokio::test]
    async fn test_remove_selected_is_single_shot() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        insert(&mut conn, &request(1, 100)).await.unwrap();
        drop(conn);

        assert_eq!(remove_selected(&pool, 1, 2).await.unwrap(), 1);
        assert_eq!(remove_selected(&pool, 1, 2).await.unwrap(), 0);

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(count_members(&mut conn, 1).await.unwrap(), (3, 1));
    }

    #[tokio::test]
    async fn test_latest_queries() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        insert(&mut conn, &request(1, 100)).await.unwrap();
        let mut newer = request(2, 200);
        newer.browser_id = Some("browser-2".into());
        newer.selected_donors = vec![DonorRef(9)];
        insert(&mut conn, &newer).await.unwrap();
        drop(conn);

        assert_eq!(latest(&pool).await.unwrap().unwrap().id, 2);
        assert_eq!(
            latest_for_browser(&pool, "browser-1").await.unwrap().unwrap().id,
            1
        );
        assert!(latest_for_browser(&pool, "nobody").await.unwrap().is_none());
        assert_eq!(list_for_donor(&pool, 1).await.unwrap().len(), 1);
        assert_eq!(latest_for_donor(&pool, 9).await.unwrap().unwrap().id, 2);
        assert_eq!(list_all(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_resets_fields_and_lists() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        insert(&mut conn, &request(1, 100)).await.unwrap();
        clear(&mut conn, 1, 500).await.unwrap();
        let stored = fetch(&mut conn, 1).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Reset);
        assert_eq!(stored.patient_info, PatientInfo::default());
        assert!(stored.found_donors.is_empty());
        assert!(stored.selected_donors.is_empty());
        assert_eq!(stored.updated_at, 500);

        assert!(matches!(
            clear(&mut conn, 99, 500).await,
            Err(RepoError::NotFound(_))
        ));
    }
}
