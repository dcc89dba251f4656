//! Data models
//!
//! Wire shapes (camelCase JSON) and, behind the `db` feature, the row
//! mappings used by the server's repositories.

pub mod donation;
pub mod donation_request;
pub mod donor;
pub mod history;
pub mod search_request;
pub mod stats;

pub use donation::{Donation, DonationStatus};
pub use donation_request::{DonationRequest, DonationRequestCreate};
pub use donor::{Donor, DonorCreate, DonorRef, DonorRole};
pub use history::{HistoryEntry, HistorySource, UnifiedHistoryEntry};
pub use search_request::{
    PatientInfo, RequestStatus, SearchFilters, SearchRequest, SearchRequestCreate, SelectionPatch,
};
pub use stats::{LiveStats, StatsDebug, StatsRecord, StatsSnapshot, StatsTargets, StatsTargetsPatch, StatsUpdate};
