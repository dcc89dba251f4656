//! Donation API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::models::{
    DonationRequest, DonationRequestCreate, Donor, PatientInfo, UnifiedHistoryEntry,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{donation_request, donor};
use crate::matching::{LegacyAcceptance, MatchError, acceptance, availability, history};
use crate::utils::validation::{
    MAX_DISABLE_DAYS, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_blood_bags, validate_blood_group,
    validate_optional_text, validate_required_text,
};
use crate::utils::{ApiResponse, AppError, AppResult, ok, ok_with_message};

/// POST /api/donations/request - ask a specific donor to donate
pub async fn create_request(
    State(state): State<ServerState>,
    Json(payload): Json<DonationRequestCreate>,
) -> AppResult<Json<ApiResponse<DonationRequest>>> {
    let donor_ref = payload
        .donor_id
        .ok_or_else(|| AppError::validation("donorId is required"))?;
    let requester_name = payload
        .requester_name
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    validate_required_text(requester_name, "requesterName", MAX_NAME_LEN)?;
    validate_optional_text(&payload.requester_phone, "requesterPhone", MAX_SHORT_TEXT_LEN)?;
    let patient_info: PatientInfo = payload
        .patient_info
        .ok_or_else(|| AppError::validation("patientInfo is required"))?;
    validate_required_text(&patient_info.patient_name, "patientInfo.patientName", MAX_NAME_LEN)?;
    validate_blood_group(&patient_info.blood_group, "patientInfo.bloodGroup", true)?;
    validate_blood_bags(patient_info.blood_bags_needed)?;

    if !donor::exists(&state.pool, donor_ref.id()).await? {
        return Err(MatchError::DonorNotFound(donor_ref.id()).into());
    }

    let request = donation_request::create(
        &state.pool,
        donor_ref.id(),
        requester_name,
        payload.requester_phone.as_deref(),
        &patient_info,
    )
    .await?;
    tracing::info!(
        request_id = %request.id,
        donor_id = %request.donor_id,
        "Donation request created"
    );
    Ok(ok(request))
}

/// GET /api/donations/my-requests - legacy requests assigned to the caller
pub async fn my_requests(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<DonationRequest>>>> {
    let requests = donation_request::list_for_donor(&state.pool, current_user.id).await?;
    Ok(ok(requests))
}

/// PUT /api/donations/{id}/accept
pub async fn accept(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<LegacyAcceptance>>> {
    let accepted = acceptance::accept_legacy(&state, id, current_user.id).await?;
    Ok(ok_with_message("Donation request accepted", accepted))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisableBody {
    pub duration_days: Option<i64>,
}

/// PATCH /api/donations/disable - stop being offered, optionally for N days
pub async fn disable(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    body: Option<Json<DisableBody>>,
) -> AppResult<Json<ApiResponse<Donor>>> {
    let duration_days = body.and_then(|Json(b)| b.duration_days);
    if let Some(days) = duration_days
        && !(1..=MAX_DISABLE_DAYS).contains(&days)
    {
        return Err(AppError::validation(format!(
            "durationDays must be between 1 and {MAX_DISABLE_DAYS}"
        )));
    }
    let updated = availability::disable_for_days(&state.pool, current_user.id, duration_days).await?;
    state.stats_hub.mark_stale();
    Ok(ok_with_message("Donation availability disabled", updated))
}

/// PATCH /api/donations/enable
pub async fn enable(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Donor>>> {
    let updated = availability::enable(&state.pool, current_user.id).await?;
    state.stats_hub.mark_stale();
    Ok(ok_with_message("Donation availability enabled", updated))
}

/// GET /api/donations/history - unified history of the caller
pub async fn history(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<UnifiedHistoryEntry>>>> {
    let entries = history::get_history(&state.pool, current_user.id).await?;
    Ok(ok(entries))
}
