//! Stats API Handlers

use axum::{Json, extract::State};
use shared::models::{StatsRecord, StatsSnapshot, StatsUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::stats::service;
use crate::utils::{ApiResponse, AppError, AppResult, ok};

/// GET /api/stats - computed platform figures
pub async fn get(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<StatsSnapshot>>> {
    let include_debug = !state.config.is_production();
    let snapshot = service::get_stats(&state.pool, include_debug).await?;
    Ok(ok(snapshot))
}

fn validate_update(patch: &StatsUpdate) -> AppResult<()> {
    let targets = patch.targets.as_ref();
    let values = [
        patch.donors,
        patch.donations,
        patch.lives,
        patch.districts,
        targets.and_then(|t| t.donors),
        targets.and_then(|t| t.donations),
        targets.and_then(|t| t.lives),
    ];
    if values.iter().flatten().any(|v| *v < 0) {
        return Err(AppError::validation("Stats values must not be negative"));
    }
    Ok(())
}

/// PATCH /api/stats - admin update of stored figures and targets
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(patch): Json<StatsUpdate>,
) -> AppResult<Json<ApiResponse<StatsRecord>>> {
    current_user.ensure_admin()?;
    validate_update(&patch)?;
    let record = service::update_stats(&state.pool, &patch).await?;
    state.stats_hub.mark_stale();
    Ok(ok(record))
}
