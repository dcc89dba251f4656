//! Acceptance transaction
//!
//! A donor accepting a request is one atomic unit: the request moves
//! forward, a history entry is appended to the donor, and the donor rests
//! for a cooldown. Two request kinds share that donor-side step and differ
//! only in their [`AcceptancePolicy`].

use serde::Serialize;
use shared::models::{
    Donation, DonationRequest, DonationStatus, Donor, DonorRef, HistoryEntry, RequestStatus,
    SearchRequest,
};
use sqlx::{SqliteConnection, SqlitePool};

use super::availability::{Cooldown, donor_error};
use super::{MatchError, bounded};
use crate::core::{Config, ServerState};
use crate::db::repository::{donation, donation_request, donor, history, search_request};
use crate::notify::{self, DonationEvent};

/// Where the cooldown is counted from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownAnchor {
    /// The scheduled donation date (falls back to acceptance time)
    ScheduledDate,
    AcceptedAt,
}

/// Which aggregate the history entry and donation point back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationKey {
    SearchRequest,
    DonationRequest,
}

impl CorrelationKey {
    /// `(search_request_id, legacy_request_id)` for the donation record
    fn donation_refs(&self, aggregate_id: i64) -> (Option<i64>, Option<i64>) {
        match self {
            Self::SearchRequest => (Some(aggregate_id), None),
            Self::DonationRequest => (None, Some(aggregate_id)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptancePolicy {
    pub cooldown: Cooldown,
    pub correlation: CorrelationKey,
    pub anchor: CooldownAnchor,
}

impl AcceptancePolicy {
    pub fn for_search(config: &Config) -> Self {
        Self {
            cooldown: Cooldown::CalendarMonths(config.cooldown_months),
            correlation: CorrelationKey::SearchRequest,
            anchor: CooldownAnchor::ScheduledDate,
        }
    }

    pub fn for_legacy(config: &Config) -> Self {
        Self {
            cooldown: Cooldown::FixedDays(config.legacy_cooldown_days),
            correlation: CorrelationKey::DonationRequest,
            anchor: CooldownAnchor::AcceptedAt,
        }
    }

    fn anchor_time(&self, accepted_at: i64, scheduled_at: Option<i64>) -> i64 {
        match self.anchor {
            CooldownAnchor::ScheduledDate => scheduled_at.unwrap_or(accepted_at),
            CooldownAnchor::AcceptedAt => accepted_at,
        }
    }
}

/// Donor-side half of every acceptance: disable until the cooldown ends
/// and append the history entry. Returns the new `disabled_until`.
pub async fn record_acceptance_for_donor(
    tx: &mut SqliteConnection,
    donor_id: i64,
    entry: &HistoryEntry,
    cooldown: Cooldown,
    anchor: i64,
) -> Result<i64, MatchError> {
    let until = cooldown.until(anchor)?;
    let now = shared::util::now_millis();
    donor::set_availability(&mut *tx, donor_id, false, Some(until), now)
        .await
        .map_err(donor_error(donor_id))?;
    history::append(&mut *tx, donor_id, entry).await?;
    Ok(until)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAcceptance {
    pub donation: Donation,
    pub search_request: SearchRequest,
    pub donor: Donor,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAcceptance {
    pub request: DonationRequest,
    pub donor: Donor,
    /// Absent when the ledger write failed after commit
    pub donation: Option<Donation>,
}

async fn accept_search_tx(
    pool: &SqlitePool,
    policy: AcceptancePolicy,
    request_id: i64,
    donor_id: i64,
    scheduled_at: Option<i64>,
) -> Result<(Donation, SearchRequest), MatchError> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    // Compare-and-swap on membership: a concurrent accept of the same pair
    // sees zero rows here
    let removed = search_request::remove_selected(&mut *tx, request_id, donor_id).await?;
    let request = search_request::fetch(&mut tx, request_id)
        .await?
        .ok_or(MatchError::SearchRequestNotFound(request_id))?;
    if removed == 0 {
        return Err(MatchError::NotSelected {
            request_id,
            donor_id,
        });
    }

    let scheduled = scheduled_at.unwrap_or(now);
    let (search_request_id, legacy_request_id) = policy.correlation.donation_refs(request_id);
    let donation = Donation {
        id: shared::util::snowflake_id(),
        search_request_id,
        legacy_request_id,
        donor_id,
        patient_info: request.patient_info.clone(),
        requester_name: request.requester_name.clone(),
        requester_phone: request.requester_phone.clone(),
        status: DonationStatus::Accepted,
        accepted_at: Some(now),
        scheduled_at: Some(scheduled),
        created_at: Some(now),
    };
    donation::insert(&mut *tx, &donation).await?;

    search_request::mark_matched(&mut *tx, request_id, donor_id, now).await?;

    let entry = HistoryEntry {
        id: shared::util::snowflake_id(),
        request_id: Some(request_id.to_string()),
        patient_info: donation.patient_info.clone(),
        requester_name: donation.requester_name.clone(),
        requester_phone: donation.requester_phone.clone(),
        accepted_at: donation.accepted_at,
        scheduled_at: donation.scheduled_at,
        created_at: donation.created_at,
    };
    record_acceptance_for_donor(
        &mut tx,
        donor_id,
        &entry,
        policy.cooldown,
        policy.anchor_time(now, Some(scheduled)),
    )
    .await?;

    let updated = search_request::fetch(&mut tx, request_id)
        .await?
        .ok_or(MatchError::SearchRequestNotFound(request_id))?;
    tx.commit().await?;

    Ok((donation, updated))
}

/// Donor accepts a search request they were selected for
pub async fn accept_search(
    state: &ServerState,
    request_id: i64,
    donor: DonorRef,
    scheduled_at: Option<i64>,
) -> Result<SearchAcceptance, MatchError> {
    let policy = AcceptancePolicy::for_search(&state.config);
    let donor_id = donor.id();

    let (donation, search_request) = bounded(
        state.config.operation_timeout(),
        "accept search request",
        accept_search_tx(&state.pool, policy, request_id, donor_id, scheduled_at),
    )
    .await?;

    tracing::info!(
        search_request_id = %request_id,
        donor_id = %donor_id,
        donation_id = %donation.id,
        "Search request accepted"
    );

    notify::dispatch(
        state.notifier.clone(),
        DonationEvent::Accepted {
            search_request_id: request_id,
            donor_id,
            donation_id: donation.id,
            scheduled_at: donation.scheduled_at.unwrap_or_default(),
        },
    );
    state.stats_hub.mark_stale();

    let donor = donor::find_with_history(&state.pool, donor_id)
        .await?
        .ok_or(MatchError::DonorNotFound(donor_id))?;

    Ok(SearchAcceptance {
        donation,
        search_request,
        donor,
    })
}

async fn accept_legacy_tx(
    pool: &SqlitePool,
    policy: AcceptancePolicy,
    request_id: i64,
    actor_id: i64,
) -> Result<DonationRequest, MatchError> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let request = donation_request::find_by_id(&mut *tx, request_id)
        .await?
        .ok_or(MatchError::DonationRequestNotFound(request_id))?;
    if request.donor_id != actor_id {
        return Err(MatchError::Unauthorized(
            "Not authorized to accept this request".into(),
        ));
    }
    if request.status != RequestStatus::Pending
        || !donation_request::mark_accepted(&mut *tx, request_id, now).await?
    {
        return Err(MatchError::NotPending(request_id));
    }

    let entry = HistoryEntry {
        id: shared::util::snowflake_id(),
        request_id: Some(request_id.to_string()),
        patient_info: request.patient_info.clone(),
        requester_name: request.requester_name.clone(),
        requester_phone: request.requester_phone.clone().unwrap_or_default(),
        accepted_at: Some(now),
        scheduled_at: None,
        created_at: Some(request.created_at),
    };
    record_acceptance_for_donor(
        &mut tx,
        actor_id,
        &entry,
        policy.cooldown,
        policy.anchor_time(now, None),
    )
    .await?;

    let accepted = donation_request::find_by_id(&mut *tx, request_id)
        .await?
        .ok_or(MatchError::DonationRequestNotFound(request_id))?;
    tx.commit().await?;
    Ok(accepted)
}

/// Ledger record for a legacy acceptance. Written after commit; a failure
/// only costs the ledger entry.
async fn record_legacy_donation(
    pool: &SqlitePool,
    policy: AcceptancePolicy,
    request: &DonationRequest,
) -> Option<Donation> {
    let (search_request_id, legacy_request_id) = policy.correlation.donation_refs(request.id);
    let donation = Donation {
        id: shared::util::snowflake_id(),
        search_request_id,
        legacy_request_id,
        donor_id: request.donor_id,
        patient_info: request.patient_info.clone(),
        requester_name: request.requester_name.clone(),
        requester_phone: request.requester_phone.clone().unwrap_or_default(),
        status: DonationStatus::Accepted,
        accepted_at: request.accepted_at,
        scheduled_at: None,
        created_at: Some(shared::util::now_millis()),
    };
    match donation::insert(pool, &donation).await {
        Ok(()) => Some(donation),
        Err(e) => {
            tracing::warn!(
                request_id = %request.id,
                error = %e,
                "Donation ledger unavailable, accepted request has no donation record"
            );
            None
        }
    }
}

/// Assigned donor accepts a legacy donation request
pub async fn accept_legacy(
    state: &ServerState,
    request_id: i64,
    actor_id: i64,
) -> Result<LegacyAcceptance, MatchError> {
    let policy = AcceptancePolicy::for_legacy(&state.config);

    let request = bounded(
        state.config.operation_timeout(),
        "accept donation request",
        accept_legacy_tx(&state.pool, policy, request_id, actor_id),
    )
    .await?;

    tracing::info!(request_id = %request_id, donor_id = %actor_id, "Donation request accepted");

    let donation = record_legacy_donation(&state.pool, policy, &request).await;

    notify::dispatch(
        state.notifier.clone(),
        DonationEvent::LegacyAccepted {
            request_id,
            donor_id: actor_id,
        },
    );
    state.stats_hub.mark_stale();

    let donor = donor::find_with_history(&state.pool, actor_id)
        .await?
        .ok_or(MatchError::DonorNotFound(actor_id))?;

    Ok(LegacyAcceptance {
        request,
        donor,
        donation,
    })
}
