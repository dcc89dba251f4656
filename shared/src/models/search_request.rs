//! Search Request Model
//!
//! One matching attempt: who the patient is, the filters the requester
//! searched with, the candidate and selected donors, and the outcome.

use serde::{Deserialize, Serialize};

use super::donor::DonorRef;

/// Lifecycle status shared by search requests and legacy donation requests.
///
/// Search requests move through `active`, `matched`, `completed`,
/// `cancelled` and `reset`; donation requests use `pending`, `accepted`
/// and `cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Active,
    Matched,
    Completed,
    Cancelled,
    Reset,
    Pending,
    Accepted,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Matched => "matched",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Reset => "reset",
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

/// Patient snapshot copied onto requests, donations and history entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase", default)]
pub struct PatientInfo {
    pub patient_name: String,
    #[cfg_attr(feature = "db", sqlx(rename = "patient_blood_group"))]
    pub blood_group: String,
    pub blood_bags_needed: i64,
}

impl Default for PatientInfo {
    fn default() -> Self {
        Self {
            patient_name: String::new(),
            blood_group: String::new(),
            blood_bags_needed: 1,
        }
    }
}

/// Location and blood-group filters the requester searched with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    #[cfg_attr(feature = "db", sqlx(rename = "filter_blood_group"))]
    pub blood_group: String,
    #[cfg_attr(feature = "db", sqlx(rename = "filter_division"))]
    pub division: String,
    #[cfg_attr(feature = "db", sqlx(rename = "filter_district"))]
    pub district: String,
    #[cfg_attr(feature = "db", sqlx(rename = "filter_upazila"))]
    pub upazila: String,
    #[cfg_attr(feature = "db", sqlx(rename = "filter_area"))]
    pub area: String,
}

/// Search request aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub id: i64,
    pub browser_id: Option<String>,
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub patient_info: PatientInfo,
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub filters: SearchFilters,
    pub requester_name: String,
    pub requester_phone: String,
    /// Candidates returned by the search, in insertion order
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub found_donors: Vec<DonorRef>,
    /// Donors the requester picked; an accept removes the donor from here
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub selected_donors: Vec<DonorRef>,
    pub status: RequestStatus,
    pub accepted_donor: Option<i64>,
    pub search_date: i64,
    pub matched_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SearchRequest {
    pub fn is_selected(&self, donor: DonorRef) -> bool {
        let key = donor.canonical();
        self.selected_donors.iter().any(|d| d.canonical() == key)
    }
}

/// Create search request payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequestCreate {
    pub browser_id: Option<String>,
    pub patient_info: Option<PatientInfo>,
    pub filters: Option<SearchFilters>,
    pub requester_name: Option<String>,
    pub requester_phone: Option<String>,
    pub found_donors: Option<Vec<DonorRef>>,
    pub selected_donors: Option<Vec<DonorRef>>,
    pub status: Option<RequestStatus>,
    pub search_date: Option<i64>,
}

/// Partial update of a search request.
///
/// `None` leaves a field untouched; `Some(vec![])` clears a donor list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPatch {
    pub selected_donors: Option<Vec<DonorRef>>,
    pub found_donors: Option<Vec<DonorRef>>,
    pub patient_info: Option<PatientInfo>,
    pub filters: Option<SearchFilters>,
    pub status: Option<RequestStatus>,
    pub cancelled_at: Option<i64>,
}

impl SelectionPatch {
    pub fn is_empty(&self) -> bool {
        self.selected_donors.is_none()
            && self.found_donors.is_none()
            && self.patient_info.is_none()
            && self.filters.is_none()
            && self.status.is_none()
            && self.cancelled_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_info_defaults_to_one_bag() {
        let info: PatientInfo = serde_json::from_str(r#"{"patientName":"Rahim"}"#).unwrap();
        assert_eq!(info.patient_name, "Rahim");
        assert_eq!(info.blood_group, "");
        assert_eq!(info.blood_bags_needed, 1);
    }

    #[test]
    fn patch_distinguishes_omitted_from_empty() {
        let omitted: SelectionPatch = serde_json::from_str(r#"{"status":"cancelled"}"#).unwrap();
        assert!(omitted.selected_donors.is_none());
        assert_eq!(omitted.status, Some(RequestStatus::Cancelled));

        let cleared: SelectionPatch = serde_json::from_str(r#"{"selectedDonors":[]}"#).unwrap();
        assert_eq!(cleared.selected_donors, Some(vec![]));
        assert!(!cleared.is_empty());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::Matched).unwrap(),
            "\"matched\""
        );
        assert_eq!(RequestStatus::Reset.as_str(), "reset");
    }

    #[test]
    fn membership_compares_canonical_form() {
        let req: SearchRequest = serde_json::from_value(serde_json::json!({
            "id": 1,
            "browserId": null,
            "patientInfo": {},
            "filters": {},
            "requesterName": "",
            "requesterPhone": "",
            "selectedDonors": [10, "11"],
            "status": "active",
            "acceptedDonor": null,
            "searchDate": 0,
            "matchedAt": null,
            "cancelledAt": null,
            "createdAt": 0,
            "updatedAt": 0
        }))
        .unwrap();
        assert!(req.is_selected(DonorRef(10)));
        assert!(req.is_selected(DonorRef(11)));
        assert!(!req.is_selected(DonorRef(12)));
    }
}
