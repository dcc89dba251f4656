//! Donor API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Donor, DonorCreate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, donor};
use crate::matching::MatchError;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_LOCATION_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_blood_group,
    validate_optional_text, validate_required_text,
};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok};

fn validate_registration(payload: &DonorCreate) -> AppResult<()> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    if !payload.email.contains('@') {
        return Err(AppError::validation("email is not a valid address"));
    }
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_blood_group(&payload.blood_group, "bloodGroup", false)?;
    validate_required_text(&payload.division, "division", MAX_LOCATION_LEN)?;
    validate_required_text(&payload.district, "district", MAX_LOCATION_LEN)?;
    if payload.upazila.len() > MAX_LOCATION_LEN || payload.area.len() > MAX_LOCATION_LEN {
        return Err(AppError::validation("upazila/area is too long"));
    }
    Ok(())
}

/// POST /api/donors - register a donor
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<DonorCreate>,
) -> AppResult<Json<ApiResponse<Donor>>> {
    validate_registration(&payload)?;
    let created = donor::create(&state.pool, payload)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::DonorEmailExists, msg),
            other => other.into(),
        })?;
    tracing::info!(donor_id = %created.id, district = %created.district, "Donor registered");
    state.stats_hub.mark_stale();
    Ok(ok(created))
}

/// GET /api/donors/{id} - profile with embedded history
pub async fn get_by_id(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Donor>>> {
    current_user.ensure_can_act_for(id)?;
    let found = donor::find_with_history(&state.pool, id)
        .await?
        .ok_or(MatchError::DonorNotFound(id))?;
    Ok(ok(found))
}
