//! Donation Model (canonical ledger record)

use serde::{Deserialize, Serialize};

use super::search_request::PatientInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    #[default]
    Accepted,
    Completed,
    Cancelled,
}

/// One donation, created by a successful acceptance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: i64,
    /// Search request that produced this donation
    #[serde(rename = "searchRequest")]
    pub search_request_id: Option<i64>,
    /// Legacy donation request that produced this donation
    #[serde(rename = "requestId")]
    pub legacy_request_id: Option<i64>,
    pub donor_id: i64,
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub patient_info: PatientInfo,
    pub requester_name: String,
    pub requester_phone: String,
    pub status: DonationStatus,
    pub accepted_at: Option<i64>,
    pub scheduled_at: Option<i64>,
    pub created_at: Option<i64>,
}

impl Donation {
    /// Correlation key shared with the donor's embedded history entry
    pub fn correlation_key(&self) -> String {
        self.legacy_request_id
            .or(self.search_request_id)
            .unwrap_or(self.id)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donation(search: Option<i64>, legacy: Option<i64>) -> Donation {
        Donation {
            id: 99,
            search_request_id: search,
            legacy_request_id: legacy,
            donor_id: 1,
            patient_info: PatientInfo::default(),
            requester_name: String::new(),
            requester_phone: String::new(),
            status: DonationStatus::Accepted,
            accepted_at: Some(0),
            scheduled_at: None,
            created_at: Some(0),
        }
    }

    #[test]
    fn correlation_key_prefers_legacy_then_search_then_own_id() {
        assert_eq!(donation(Some(5), Some(6)).correlation_key(), "6");
        assert_eq!(donation(Some(5), None).correlation_key(), "5");
        assert_eq!(donation(None, None).correlation_key(), "99");
    }

    #[test]
    fn wire_names_follow_ledger_shape() {
        let json = serde_json::to_value(donation(Some(5), None)).unwrap();
        assert_eq!(json["searchRequest"], 5);
        assert!(json["requestId"].is_null());
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["patientInfo"]["bloodBagsNeeded"], 1);
    }
}
