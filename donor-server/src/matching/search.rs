//! Search request aggregate
//!
//! Candidate (`found`) and selected donor lists are ordered sets: the first
//! occurrence of a donor wins and later duplicates are dropped.

use std::collections::HashSet;

use serde::Serialize;
use shared::models::{DonorRef, RequestStatus, SearchRequest, SearchRequestCreate, SelectionPatch};
use sqlx::{SqliteConnection, SqlitePool};

use super::MatchError;
use crate::db::repository::search_request::{self, DonorList};
use crate::db::repository::RepoError;

/// Result of removing a donor from the selected list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Removal {
    pub search_request: SearchRequest,
    pub removed_count: u64,
}

fn request_error(id: i64) -> impl FnOnce(RepoError) -> MatchError {
    move |e| match e {
        RepoError::NotFound(_) => MatchError::SearchRequestNotFound(id),
        other => MatchError::Repo(other),
    }
}

/// Drop repeated donors, keeping first-seen order
pub fn dedup_donors(donors: Vec<DonorRef>) -> Vec<DonorRef> {
    let mut seen = HashSet::with_capacity(donors.len());
    donors.into_iter().filter(|d| seen.insert(*d)).collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn reload(conn: &mut SqliteConnection, id: i64) -> Result<SearchRequest, MatchError> {
    search_request::fetch(conn, id)
        .await?
        .ok_or(MatchError::SearchRequestNotFound(id))
}

pub async fn create(pool: &SqlitePool, input: SearchRequestCreate) -> Result<SearchRequest, MatchError> {
    let now = shared::util::now_millis();
    let request = SearchRequest {
        id: shared::util::snowflake_id(),
        browser_id: non_empty(input.browser_id),
        patient_info: input.patient_info.unwrap_or_default(),
        filters: input.filters.unwrap_or_default(),
        requester_name: input.requester_name.unwrap_or_default(),
        requester_phone: input.requester_phone.unwrap_or_default(),
        found_donors: dedup_donors(input.found_donors.unwrap_or_default()),
        selected_donors: dedup_donors(input.selected_donors.unwrap_or_default()),
        status: input.status.unwrap_or(RequestStatus::Active),
        accepted_donor: None,
        search_date: input.search_date.unwrap_or(now),
        matched_at: None,
        cancelled_at: None,
        created_at: now,
        updated_at: now,
    };

    let mut tx = pool.begin().await?;
    search_request::insert(&mut tx, &request).await?;
    tx.commit().await?;

    tracing::info!(
        search_request_id = %request.id,
        found = request.found_donors.len(),
        selected = request.selected_donors.len(),
        "Search request created"
    );
    Ok(request)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<SearchRequest, MatchError> {
    search_request::find_by_id(pool, id)
        .await?
        .ok_or(MatchError::SearchRequestNotFound(id))
}

/// Partial update; omitted fields are left alone, an empty list clears
pub async fn update_selection(
    pool: &SqlitePool,
    id: i64,
    patch: SelectionPatch,
) -> Result<SearchRequest, MatchError> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    search_request::update_fields(&mut tx, id, &patch, now)
        .await
        .map_err(request_error(id))?;
    if let Some(found) = patch.found_donors {
        search_request::replace_list(&mut tx, id, DonorList::Found, &dedup_donors(found)).await?;
    }
    if let Some(selected) = patch.selected_donors {
        search_request::replace_list(&mut tx, id, DonorList::Selected, &dedup_donors(selected))
            .await?;
    }

    let updated = reload(&mut tx, id).await?;
    tx.commit().await?;
    Ok(updated)
}

/// Apply the patch to the browser's latest aggregate, creating one when
/// the browser has none yet
pub async fn update_latest_for_browser(
    pool: &SqlitePool,
    browser_id: &str,
    patch: SelectionPatch,
) -> Result<SearchRequest, MatchError> {
    match search_request::latest_for_browser(pool, browser_id).await? {
        Some(existing) => update_selection(pool, existing.id, patch).await,
        None => {
            let input = SearchRequestCreate {
                browser_id: Some(browser_id.to_string()),
                patient_info: patch.patient_info,
                filters: patch.filters,
                found_donors: patch.found_donors,
                selected_donors: patch.selected_donors,
                status: patch.status,
                ..Default::default()
            };
            create(pool, input).await
        }
    }
}

pub async fn reset(pool: &SqlitePool, id: i64) -> Result<SearchRequest, MatchError> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;
    search_request::clear(&mut tx, id, now)
        .await
        .map_err(request_error(id))?;
    let updated = reload(&mut tx, id).await?;
    tx.commit().await?;
    tracing::info!(search_request_id = %id, "Search request reset");
    Ok(updated)
}

/// `None` when the browser has nothing to reset
pub async fn reset_latest_for_browser(
    pool: &SqlitePool,
    browser_id: &str,
) -> Result<Option<SearchRequest>, MatchError> {
    match search_request::latest_for_browser(pool, browser_id).await? {
        Some(existing) => reset(pool, existing.id).await.map(Some),
        None => Ok(None),
    }
}

async fn remove_from_selection(
    pool: &SqlitePool,
    id: i64,
    donor: DonorRef,
    reopen_when_empty: bool,
) -> Result<Removal, MatchError> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    search_request::touch(&mut *tx, id, now)
        .await
        .map_err(request_error(id))?;
    let removed_count = search_request::remove_selected(&mut *tx, id, donor.id()).await?;

    if reopen_when_empty {
        let (found, selected) = search_request::count_members(&mut tx, id).await?;
        if found == 0 && selected == 0 {
            search_request::set_status(&mut *tx, id, RequestStatus::Active, now).await?;
        }
    }

    let search_request = reload(&mut tx, id).await?;
    tx.commit().await?;

    Ok(Removal {
        search_request,
        removed_count,
    })
}

/// Donor withdraws from the selection. When no candidates remain at all
/// the request goes back to `active`.
pub async fn decline(pool: &SqlitePool, id: i64, donor: DonorRef) -> Result<Removal, MatchError> {
    let removal = remove_from_selection(pool, id, donor, true).await?;
    tracing::info!(
        search_request_id = %id,
        donor_id = %donor,
        removed = removal.removed_count,
        "Donor declined search request"
    );
    Ok(removal)
}

/// Donor turns the request down; status is left as is
pub async fn reject(pool: &SqlitePool, id: i64, donor: DonorRef) -> Result<Removal, MatchError> {
    let removal = remove_from_selection(pool, id, donor, false).await?;
    tracing::info!(
        search_request_id = %id,
        donor_id = %donor,
        removed = removal.removed_count,
        "Donor rejected search request"
    );
    Ok(removal)
}

pub async fn latest(pool: &SqlitePool) -> Result<Option<SearchRequest>, MatchError> {
    Ok(search_request::latest(pool).await?)
}

pub async fn latest_for_browser(
    pool: &SqlitePool,
    browser_id: &str,
) -> Result<Option<SearchRequest>, MatchError> {
    Ok(search_request::latest_for_browser(pool, browser_id).await?)
}

pub async fn latest_for_donor(
    pool: &SqlitePool,
    donor_id: i64,
) -> Result<Option<SearchRequest>, MatchError> {
    Ok(search_request::latest_for_donor(pool, donor_id).await?)
}

pub async fn list_for_donor(pool: &SqlitePool, donor_id: i64) -> Result<Vec<SearchRequest>, MatchError> {
    Ok(search_request::list_for_donor(pool, donor_id).await?)
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<SearchRequest>, MatchError> {
    Ok(search_request::list_all(pool).await?)
}
