//! Donation history shapes

use serde::{Deserialize, Serialize};

use super::donation::DonationStatus;
use super::search_request::PatientInfo;

/// History entry embedded in a donor, written once per acceptance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    /// Correlation key: the search request id, or the legacy request id
    pub request_id: Option<String>,
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub patient_info: PatientInfo,
    pub requester_name: String,
    pub requester_phone: String,
    pub accepted_at: Option<i64>,
    pub scheduled_at: Option<i64>,
    pub created_at: Option<i64>,
}

/// Where a unified history entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistorySource {
    DonationDoc,
    UserEmbedded,
}

/// Normalized entry returned by the unified history endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedHistoryEntry {
    pub id: Option<String>,
    pub request_id: Option<String>,
    pub patient_info: PatientInfo,
    pub requester_name: String,
    pub requester_phone: String,
    pub accepted_at: Option<i64>,
    pub scheduled_at: Option<i64>,
    pub created_at: Option<i64>,
    pub status: DonationStatus,
    pub source: HistorySource,
}
