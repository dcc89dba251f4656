//! Donation Request Model (legacy single-assignee request)

use serde::{Deserialize, Serialize};

use super::donor::DonorRef;
use super::search_request::{PatientInfo, RequestStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub id: i64,
    /// Assigned donor
    pub donor_id: i64,
    pub requester_name: String,
    pub requester_phone: Option<String>,
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub patient_info: PatientInfo,
    pub status: RequestStatus,
    pub accepted_at: Option<i64>,
    pub created_at: i64,
}

/// Create donation request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequestCreate {
    pub donor_id: Option<DonorRef>,
    pub requester_name: Option<String>,
    pub requester_phone: Option<String>,
    pub patient_info: Option<PatientInfo>,
}
