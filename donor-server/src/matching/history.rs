//! Unified donation history
//!
//! A donor's history lives in two places: the donation ledger and the
//! entries embedded in the donor. Both are normalized into one shape,
//! deduplicated on a stable key (ledger first) and sorted newest first.

use std::collections::HashSet;

use shared::models::{
    Donation, DonationStatus, HistoryEntry, HistorySource, UnifiedHistoryEntry,
};
use shared::util::millis_to_rfc3339;
use sqlx::SqlitePool;

use super::MatchError;
use crate::db::repository::{donation, donor, history};

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn from_donation(doc: &Donation) -> UnifiedHistoryEntry {
    let accepted_at = doc.accepted_at.or(doc.created_at);
    let created_at = doc.created_at.or(accepted_at);
    UnifiedHistoryEntry {
        id: Some(doc.id.to_string()),
        request_id: Some(doc.correlation_key()),
        patient_info: doc.patient_info.clone(),
        requester_name: doc.requester_name.clone(),
        requester_phone: doc.requester_phone.clone(),
        accepted_at,
        scheduled_at: doc.scheduled_at,
        created_at,
        status: doc.status,
        source: HistorySource::DonationDoc,
    }
}

fn from_embedded(entry: &HistoryEntry) -> UnifiedHistoryEntry {
    let accepted_at = entry.accepted_at.or(entry.created_at);
    let created_at = entry.created_at.or(accepted_at);
    let id = entry.id.to_string();
    UnifiedHistoryEntry {
        request_id: non_empty(entry.request_id.clone()).or_else(|| Some(id.clone())),
        id: Some(id),
        patient_info: entry.patient_info.clone(),
        requester_name: entry.requester_name.clone(),
        requester_phone: entry.requester_phone.clone(),
        accepted_at,
        scheduled_at: entry.scheduled_at,
        created_at,
        status: DonationStatus::Accepted,
        source: HistorySource::UserEmbedded,
    }
}

/// Identity of an entry across both sources: request id, then own id,
/// then patient name plus acceptance time
pub fn dedup_key(entry: &UnifiedHistoryEntry) -> String {
    if let Some(request_id) = entry.request_id.as_deref().filter(|s| !s.is_empty()) {
        return format!("req:{request_id}");
    }
    if let Some(id) = entry.id.as_deref().filter(|s| !s.is_empty()) {
        return format!("id:{id}");
    }
    let name = entry.patient_info.patient_name.trim().to_lowercase();
    let time = entry
        .accepted_at
        .or(entry.created_at)
        .and_then(millis_to_rfc3339)
        .unwrap_or_default();
    format!("cmp:{name}::{time}")
}

fn sort_time(entry: &UnifiedHistoryEntry) -> i64 {
    entry.accepted_at.or(entry.created_at).unwrap_or(0)
}

/// Merge ledger records and embedded entries. Pure: same input, same output.
pub fn unify(docs: &[Donation], embedded: &[HistoryEntry]) -> Vec<UnifiedHistoryEntry> {
    let mut seen = HashSet::new();
    let mut merged: Vec<UnifiedHistoryEntry> = docs
        .iter()
        .map(from_donation)
        .chain(embedded.iter().map(from_embedded))
        .filter(|entry| seen.insert(dedup_key(entry)))
        .collect();

    // Stable: equal times keep ledger-first insertion order
    merged.sort_by_key(|entry| std::cmp::Reverse(sort_time(entry)));
    merged
}

/// Unified history of one donor. A failing ledger read degrades to the
/// embedded entries only.
pub async fn get_history(
    pool: &SqlitePool,
    donor_id: i64,
) -> Result<Vec<UnifiedHistoryEntry>, MatchError> {
    if !donor::exists(pool, donor_id).await? {
        return Err(MatchError::DonorNotFound(donor_id));
    }

    let docs = match donation::list_for_donor(pool, donor_id).await {
        Ok(docs) => docs,
        Err(e) => {
            tracing::warn!(donor_id = %donor_id, error = %e, "Donation ledger unavailable, serving embedded history only");
            Vec::new()
        }
    };
    let embedded = history::list_for_donor(pool, donor_id).await?;

    Ok(unify(&docs, &embedded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PatientInfo;

    fn patient(name: &str) -> PatientInfo {
        PatientInfo {
            patient_name: name.into(),
            blood_group: "B+".into(),
            blood_bags_needed: 1,
        }
    }

    fn doc(id: i64, search: Option<i64>, accepted_at: Option<i64>) -> Donation {
        Donation {
            id,
            search_request_id: search,
            legacy_request_id: None,
            donor_id: 1,
            patient_info: patient("Rahim"),
            requester_name: "Nadia".into(),
            requester_phone: String::new(),
            status: DonationStatus::Accepted,
            accepted_at,
            scheduled_at: None,
            created_at: accepted_at,
        }
    }

    fn embedded(id: i64, request_id: Option<&str>, accepted_at: Option<i64>) -> HistoryEntry {
        HistoryEntry {
            id,
            request_id: request_id.map(str::to_string),
            patient_info: patient("Rahim"),
            requester_name: "Nadia".into(),
            requester_phone: String::new(),
            accepted_at,
            scheduled_at: None,
            created_at: accepted_at,
        }
    }

    #[test]
    fn test_shared_request_id_keeps_ledger_copy() {
        let merged = unify(
            &[doc(10, Some(500), Some(1_000))],
            &[embedded(20, Some("500"), Some(1_000))],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, HistorySource::DonationDoc);
        assert_eq!(merged[0].request_id.as_deref(), Some("500"));
    }

    #[test]
    fn test_distinct_entries_sorted_newest_first() {
        let merged = unify(
            &[doc(10, Some(500), Some(1_000))],
            &[
                embedded(20, Some("600"), Some(3_000)),
                embedded(21, Some("700"), Some(2_000)),
            ],
        );
        let order: Vec<_> = merged.iter().map(|e| e.request_id.clone().unwrap()).collect();
        assert_eq!(order, vec!["600", "700", "500"]);
    }

    #[test]
    fn test_normalizes_missing_times() {
        let mut entry = embedded(20, Some("600"), None);
        entry.created_at = Some(42);
        let merged = unify(&[], &[entry]);
        assert_eq!(merged[0].accepted_at, Some(42));
        assert_eq!(merged[0].created_at, Some(42));
        assert_eq!(merged[0].status, DonationStatus::Accepted);

        let mut d = doc(10, None, Some(7));
        d.created_at = None;
        let merged = unify(&[d], &[]);
        assert_eq!(merged[0].created_at, Some(7));
        assert_eq!(merged[0].request_id.as_deref(), Some("10"));
    }

    #[test]
    fn test_equal_times_keep_insertion_order() {
        let merged = unify(
            &[doc(10, Some(1), Some(5)), doc(11, Some(2), Some(5))],
            &[embedded(20, Some("3"), Some(5))],
        );
        let order: Vec<_> = merged.iter().map(|e| e.request_id.clone().unwrap()).collect();
        assert_eq!(order, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_unify_is_idempotent_with_unique_keys() {
        let docs = [doc(10, Some(500), Some(1_000)), doc(11, None, None)];
        let entries = [
            embedded(20, Some("500"), Some(1_000)),
            embedded(21, Some(""), Some(9)),
        ];
        let first = unify(&docs, &entries);
        let second = unify(&docs, &entries);
        assert_eq!(first, second);

        let keys: HashSet<_> = first.iter().map(dedup_key).collect();
        assert_eq!(keys.len(), first.len());
    }

    #[test]
    fn test_dedup_key_fallbacks() {
        let mut entry = from_embedded(&embedded(20, Some("9"), Some(0)));
        assert_eq!(dedup_key(&entry), "req:9");

        entry.request_id = None;
        assert_eq!(dedup_key(&entry), "id:20");

        entry.id = None;
        entry.patient_info.patient_name = "  Rahim ".into();
        assert_eq!(dedup_key(&entry), "cmp:rahim::1970-01-01T00:00:00.000Z");
    }

    async fn seed_donor(pool: &SqlitePool) -> i64 {
        donor::create(
            pool,
            shared::models::DonorCreate {
                name: "Karim".into(),
                email: "karim@example.com".into(),
                phone: None,
                blood_group: "B+".into(),
                division: "Dhaka".into(),
                district: "Dhaka".into(),
                upazila: String::new(),
                area: String::new(),
                want_to_donate: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_ledger_failure_serves_embedded_entries() {
        let pool = crate::db::test_pool().await;
        let donor_id = seed_donor(&pool).await;
        history::append(&pool, donor_id, &embedded(30, Some("900"), Some(5_000)))
            .await
            .unwrap();
        history::append(&pool, donor_id, &embedded(31, None, Some(6_000)))
            .await
            .unwrap();

        sqlx::query("DROP TABLE donation").execute(&pool).await.unwrap();

        let entries = get_history(&pool, donor_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.source == HistorySource::UserEmbedded));
        assert_eq!(entries[0].request_id.as_deref(), Some("31"));
        assert_eq!(entries[1].request_id.as_deref(), Some("900"));
    }

    #[tokio::test]
    async fn test_unknown_donor_is_not_found() {
        let pool = crate::db::test_pool().await;
        assert!(matches!(
            get_history(&pool, 404).await,
            Err(MatchError::DonorNotFound(404))
        ));
    }
}
