//! Lifecycle scenarios through the library API

mod common;

use std::sync::Arc;

use donor_server::db::repository::{donation, donor, history as history_repo};
use donor_server::matching::{MatchError, acceptance, history, search, sweep};
use donor_server::notify::{DonationEvent, Notifier, NotifyError};
use shared::models::{
    Donation, DonationStatus, DonorRef, HistoryEntry, HistorySource, RequestStatus,
    SearchRequestCreate,
};

use common::{patient, seed_donor, state};

#[tokio::test]
async fn decline_then_accept_matches_second_donor() {
    let state = state().await;
    let d1 = seed_donor(&state.pool, "Karim").await;
    let d2 = seed_donor(&state.pool, "Salma").await;

    let request = search::create(
        &state.pool,
        SearchRequestCreate {
            patient_info: Some(patient()),
            requester_name: Some("Nadia".into()),
            requester_phone: Some("01800000000".into()),
            selected_donors: Some(vec![DonorRef(d1), DonorRef(d2)]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let removal = search::decline(&state.pool, request.id, DonorRef(d1))
        .await
        .unwrap();
    assert_eq!(removal.removed_count, 1);
    assert_eq!(removal.search_request.selected_donors, vec![DonorRef(d2)]);
    assert_eq!(removal.search_request.status, RequestStatus::Active);

    let outcome = acceptance::accept_search(&state, request.id, DonorRef(d2), None)
        .await
        .unwrap();
    assert!(outcome.search_request.selected_donors.is_empty());
    assert_eq!(outcome.search_request.status, RequestStatus::Matched);
    assert_eq!(outcome.search_request.accepted_donor, Some(d2));
    assert!(!outcome.donor.want_to_donate);
    assert!(outcome.donor.disabled_until.is_some());

    let docs = donation::list_for_search_request(&state.pool, request.id)
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].donor_id, d2);

    // The declining donor is untouched
    let karim = donor::find_by_id(&state.pool, d1).await.unwrap().unwrap();
    assert!(karim.want_to_donate);
}

#[tokio::test]
async fn accept_writes_one_history_entry_and_one_donation_with_same_key() {
    let state = state().await;
    let d1 = seed_donor(&state.pool, "Karim").await;
    let request = search::create(
        &state.pool,
        SearchRequestCreate {
            patient_info: Some(patient()),
            selected_donors: Some(vec![DonorRef(d1)]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    acceptance::accept_search(&state, request.id, DonorRef(d1), None)
        .await
        .unwrap();

    let entries = history_repo::list_for_donor(&state.pool, d1).await.unwrap();
    let docs = donation::list_for_donor(&state.pool, d1).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(docs.len(), 1);
    assert_eq!(entries[0].request_id.as_deref(), Some(request.id.to_string().as_str()));
    assert_eq!(docs[0].correlation_key(), request.id.to_string());
}

#[tokio::test]
async fn accept_by_unselected_donor_changes_nothing() {
    let state = state().await;
    let d1 = seed_donor(&state.pool, "Karim").await;
    let outsider = seed_donor(&state.pool, "Outsider").await;
    let request = search::create(
        &state.pool,
        SearchRequestCreate {
            selected_donors: Some(vec![DonorRef(d1)]),
            found_donors: Some(vec![DonorRef(d1), DonorRef(outsider)]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let err = acceptance::accept_search(&state, request.id, DonorRef(outsider), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::NotSelected { .. }));

    let after = search::get(&state.pool, request.id).await.unwrap();
    assert_eq!(after.selected_donors, request.selected_donors);
    assert_eq!(after.found_donors, request.found_donors);
    assert_eq!(after.status, request.status);
    assert_eq!(after.updated_at, request.updated_at);

    let outsider_row = donor::find_by_id(&state.pool, outsider).await.unwrap().unwrap();
    assert!(outsider_row.want_to_donate);
    assert!(history_repo::list_for_donor(&state.pool, outsider).await.unwrap().is_empty());
    assert!(donation::list_for_donor(&state.pool, outsider).await.unwrap().is_empty());
}

#[tokio::test]
async fn second_accept_of_same_pair_is_rejected() {
    let state = state().await;
    let d1 = seed_donor(&state.pool, "Karim").await;
    let request = search::create(
        &state.pool,
        SearchRequestCreate {
            selected_donors: Some(vec![DonorRef(d1)]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    acceptance::accept_search(&state, request.id, DonorRef(d1), None)
        .await
        .unwrap();
    let err = acceptance::accept_search(&state, request.id, DonorRef(d1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::NotSelected { .. }));
    assert_eq!(donation::list_for_donor(&state.pool, d1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sweep_restores_donor_whose_cooldown_just_ended() {
    let state = state().await;
    let u1 = seed_donor(&state.pool, "Karim").await;
    let now = shared::util::now_millis();
    donor::set_availability(&state.pool, u1, false, Some(now - 1_000), now - 5_000)
        .await
        .unwrap();

    assert_eq!(sweep::run_sweep(&state.pool, now).await.unwrap(), 1);
    let restored = donor::find_by_id(&state.pool, u1).await.unwrap().unwrap();
    assert!(restored.want_to_donate);
    assert_eq!(restored.disabled_until, None);

    assert_eq!(sweep::run_sweep(&state.pool, now).await.unwrap(), 0);
}

#[tokio::test]
async fn history_prefers_ledger_entry_on_shared_request_id() {
    let state = state().await;
    let u1 = seed_donor(&state.pool, "Karim").await;

    let doc = Donation {
        id: 9001,
        search_request_id: Some(4242),
        legacy_request_id: None,
        donor_id: u1,
        patient_info: patient(),
        requester_name: "Nadia".into(),
        requester_phone: "018".into(),
        status: DonationStatus::Completed,
        accepted_at: Some(1_000),
        scheduled_at: Some(2_000),
        created_at: Some(1_000),
    };
    donation::insert(&state.pool, &doc).await.unwrap();
    history_repo::append(
        &state.pool,
        u1,
        &HistoryEntry {
            id: 9002,
            request_id: Some("4242".into()),
            patient_info: patient(),
            requester_name: "Nadia".into(),
            requester_phone: "018".into(),
            accepted_at: Some(1_000),
            scheduled_at: Some(2_000),
            created_at: Some(1_000),
        },
    )
    .await
    .unwrap();

    let first = history::get_history(&state.pool, u1).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].source, HistorySource::DonationDoc);
    assert_eq!(first[0].status, DonationStatus::Completed);

    let second = history::get_history(&state.pool, u1).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn legacy_accept_rests_donor_for_fixed_days() {
    let state = state().await;
    let d1 = seed_donor(&state.pool, "Karim").await;
    let request = donor_server::db::repository::donation_request::create(
        &state.pool,
        d1,
        "Nadia",
        Some("018"),
        &patient(),
    )
    .await
    .unwrap();

    let outcome = acceptance::accept_legacy(&state, request.id, d1).await.unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Accepted);
    let accepted_at = outcome.request.accepted_at.unwrap();
    let expected = accepted_at + state.config.legacy_cooldown_days * 24 * 60 * 60 * 1000;
    let until = outcome.donor.disabled_until.unwrap();
    // accepted_at and the cooldown anchor come from two clock reads
    assert!((until - expected).abs() < 5_000);

    let unified = history::get_history(&state.pool, d1).await.unwrap();
    assert_eq!(unified.len(), 1);
    assert_eq!(unified[0].request_id.as_deref(), Some(request.id.to_string().as_str()));

    let again = acceptance::accept_legacy(&state, request.id, d1).await.unwrap_err();
    assert!(matches!(again, MatchError::NotPending(_)));
}

struct ChannelNotifier(tokio::sync::mpsc::UnboundedSender<DonationEvent>);

#[async_trait::async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, event: &DonationEvent) -> Result<(), NotifyError> {
        self.0
            .send(event.clone())
            .map_err(|e| NotifyError::Unavailable(e.to_string()))
    }
}

#[tokio::test]
async fn accept_notifies_after_commit() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let state = state().await.with_notifier(Arc::new(ChannelNotifier(tx)));
    let d1 = seed_donor(&state.pool, "Karim").await;
    let request = search::create(
        &state.pool,
        SearchRequestCreate {
            selected_donors: Some(vec![DonorRef(d1)]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let outcome = acceptance::accept_search(&state, request.id, DonorRef(d1), Some(5_000))
        .await
        .unwrap();

    let event = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        event,
        DonationEvent::Accepted {
            search_request_id: request.id,
            donor_id: d1,
            donation_id: outcome.donation.id,
            scheduled_at: 5_000,
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_of_one_pair_succeed_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    let db = donor_server::db::DbService::new(path.to_str().unwrap())
        .await
        .unwrap();
    let mut config = donor_server::Config::default();
    config.sweep_on_startup = false;
    let state = donor_server::ServerState::for_pool(config, db.pool);

    let d1 = seed_donor(&state.pool, "Karim").await;
    let request = search::create(
        &state.pool,
        SearchRequestCreate {
            patient_info: Some(patient()),
            selected_donors: Some(vec![DonorRef(d1)]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    const RACERS: usize = 8;
    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move {
                acceptance::accept_search(&state, request.id, DonorRef(d1), None).await
            })
        })
        .collect();

    let mut accepted = 0;
    let mut not_selected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(MatchError::NotSelected { .. }) => not_selected += 1,
            Err(other) => panic!("unexpected accept error: {other}"),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(not_selected, RACERS - 1);

    let docs = donation::list_for_search_request(&state.pool, request.id)
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(history_repo::list_for_donor(&state.pool, d1).await.unwrap().len(), 1);
}
