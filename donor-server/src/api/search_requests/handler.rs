//! Search Request API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::models::{
    DonorRef, PatientInfo, SearchFilters, SearchRequest, SearchRequestCreate, SelectionPatch,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::matching::{Removal, SearchAcceptance, acceptance, search};
use crate::notify::{self, DonationEvent};
use crate::utils::validation::{
    MAX_LOCATION_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_blood_bags, validate_blood_group,
    validate_optional_text,
};
use crate::utils::{ApiResponse, AppError, AppResult, ok, ok_with_message};

fn parse_donor(raw: &str) -> AppResult<DonorRef> {
    raw.parse::<DonorRef>().map_err(AppError::validation)
}

/// Resolve the path donor and check the caller may act for them
fn authorize_donor(current_user: &CurrentUser, raw: &str) -> AppResult<DonorRef> {
    let donor = parse_donor(raw)?;
    current_user.ensure_can_act_for(donor.id())?;
    Ok(donor)
}

fn validate_patient(info: &PatientInfo) -> AppResult<()> {
    if info.patient_name.len() > MAX_NAME_LEN {
        return Err(AppError::validation("patientName is too long"));
    }
    validate_blood_group(&info.blood_group, "patientInfo.bloodGroup", true)?;
    validate_blood_bags(info.blood_bags_needed)
}

fn validate_filters(filters: &SearchFilters) -> AppResult<()> {
    validate_blood_group(&filters.blood_group, "filters.bloodGroup", true)?;
    let too_long = [
        &filters.division,
        &filters.district,
        &filters.upazila,
        &filters.area,
    ]
    .iter()
    .any(|v| v.len() > MAX_LOCATION_LEN);
    if too_long {
        return Err(AppError::validation(format!(
            "filter location values are limited to {MAX_LOCATION_LEN} chars"
        )));
    }
    Ok(())
}

fn validate_create(payload: &SearchRequestCreate) -> AppResult<()> {
    validate_optional_text(&payload.browser_id, "browserId", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.requester_name, "requesterName", MAX_NAME_LEN)?;
    validate_optional_text(&payload.requester_phone, "requesterPhone", MAX_SHORT_TEXT_LEN)?;
    if let Some(info) = &payload.patient_info {
        validate_patient(info)?;
    }
    if let Some(filters) = &payload.filters {
        validate_filters(filters)?;
    }
    Ok(())
}

fn validate_patch(patch: &SelectionPatch) -> AppResult<()> {
    if patch.is_empty() {
        return Err(AppError::invalid_request("No fields to update"));
    }
    validate_patch_fields(patch)
}

/// Field checks only; an empty patch is allowed
fn validate_patch_fields(patch: &SelectionPatch) -> AppResult<()> {
    if let Some(info) = &patch.patient_info {
        validate_patient(info)?;
    }
    if let Some(filters) = &patch.filters {
        validate_filters(filters)?;
    }
    Ok(())
}

fn validate_browser_id(browser_id: &str) -> AppResult<()> {
    let trimmed = browser_id.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_SHORT_TEXT_LEN {
        return Err(AppError::validation("browserId is empty or too long"));
    }
    Ok(())
}

/// POST /api/search-requests - create a search request
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<SearchRequestCreate>,
) -> AppResult<Json<ApiResponse<SearchRequest>>> {
    validate_create(&payload)?;
    let created = search::create(&state.pool, payload).await?;
    Ok(ok(created))
}

/// GET /api/search-requests - every search request, newest first
pub async fn list_all(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<SearchRequest>>>> {
    current_user.ensure_admin()?;
    let all = search::list_all(&state.pool).await?;
    Ok(ok(all))
}

/// GET /api/search-requests/latest
pub async fn latest(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<SearchRequest>>> {
    let found = search::latest(&state.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Latest search request"))?;
    Ok(ok(found))
}

/// GET /api/search-requests/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<SearchRequest>>> {
    let found = search::get(&state.pool, id).await?;
    Ok(ok(found))
}

/// PATCH /api/search-requests/{id} - partial update of the selection
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(patch): Json<SelectionPatch>,
) -> AppResult<Json<ApiResponse<SearchRequest>>> {
    validate_patch(&patch)?;
    let updated = search::update_selection(&state.pool, id, patch).await?;
    Ok(ok(updated))
}

/// DELETE /api/search-requests/{id}/reset
pub async fn reset(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<SearchRequest>>> {
    let cleared = search::reset(&state.pool, id).await?;
    Ok(ok_with_message("Search request reset", cleared))
}

/// GET /api/search-requests/browser/{browserId}/latest
pub async fn latest_for_browser(
    State(state): State<ServerState>,
    Path(browser_id): Path<String>,
) -> AppResult<Json<ApiResponse<SearchRequest>>> {
    validate_browser_id(&browser_id)?;
    let found = search::latest_for_browser(&state.pool, browser_id.trim())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Search request for browser {browser_id}")))?;
    Ok(ok(found))
}

/// PUT /api/search-requests/browser/{browserId}/latest - update, or create
/// when the browser has none
pub async fn update_latest_for_browser(
    State(state): State<ServerState>,
    Path(browser_id): Path<String>,
    Json(patch): Json<SelectionPatch>,
) -> AppResult<Json<ApiResponse<SearchRequest>>> {
    validate_browser_id(&browser_id)?;
    // `{}` creates the browser's first aggregate
    validate_patch_fields(&patch)?;
    let updated = search::update_latest_for_browser(&state.pool, browser_id.trim(), patch).await?;
    Ok(ok(updated))
}

/// DELETE /api/search-requests/browser/{browserId}/reset
pub async fn reset_for_browser(
    State(state): State<ServerState>,
    Path(browser_id): Path<String>,
) -> AppResult<Json<ApiResponse<Option<SearchRequest>>>> {
    validate_browser_id(&browser_id)?;
    match search::reset_latest_for_browser(&state.pool, browser_id.trim()).await? {
        Some(cleared) => Ok(ok_with_message("Search request reset", Some(cleared))),
        None => Ok(ok_with_message("Nothing to reset", None)),
    }
}

/// GET /api/search-requests/donor/{donorId} - requests that selected the donor
pub async fn list_for_donor(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(donor_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<SearchRequest>>>> {
    let donor = authorize_donor(&current_user, &donor_id)?;
    let requests = search::list_for_donor(&state.pool, donor.id()).await?;
    Ok(ok(requests))
}

/// GET /api/search-requests/donor/{donorId}/latest
pub async fn latest_for_donor(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(donor_id): Path<String>,
) -> AppResult<Json<ApiResponse<SearchRequest>>> {
    let donor = authorize_donor(&current_user, &donor_id)?;
    let found = search::latest_for_donor(&state.pool, donor.id())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Search request selecting donor {donor}")))?;
    Ok(ok(found))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptBody {
    pub scheduled_at: Option<i64>,
}

/// PUT /api/search-requests/donor/{donorId}/{id}/accept
pub async fn accept(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path((donor_id, id)): Path<(String, i64)>,
    body: Option<Json<AcceptBody>>,
) -> AppResult<Json<ApiResponse<SearchAcceptance>>> {
    let donor = authorize_donor(&current_user, &donor_id)?;
    let scheduled_at = body.and_then(|Json(b)| b.scheduled_at);
    let accepted = acceptance::accept_search(&state, id, donor, scheduled_at).await?;
    Ok(ok_with_message("Search request accepted", accepted))
}

/// DELETE /api/search-requests/donor/{donorId}/{id}/decline
pub async fn decline(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path((donor_id, id)): Path<(String, i64)>,
) -> AppResult<Json<ApiResponse<Removal>>> {
    let donor = authorize_donor(&current_user, &donor_id)?;
    let removal = search::decline(&state.pool, id, donor).await?;
    if removal.removed_count > 0 {
        notify::dispatch(
            state.notifier.clone(),
            DonationEvent::Declined {
                search_request_id: id,
                donor_id: donor.id(),
            },
        );
    }
    Ok(ok(removal))
}

/// PUT /api/search-requests/donor/{donorId}/{id}/reject
pub async fn reject(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path((donor_id, id)): Path<(String, i64)>,
) -> AppResult<Json<ApiResponse<Removal>>> {
    let donor = authorize_donor(&current_user, &donor_id)?;
    let removal = search::reject(&state.pool, id, donor).await?;
    if removal.removed_count > 0 {
        notify::dispatch(
            state.notifier.clone(),
            DonationEvent::Rejected {
                search_request_id: id,
                donor_id: donor.id(),
            },
        );
    }
    Ok(ok(removal))
}
