//! Stats Models

use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET_DONORS: i64 = 300_000;
pub const DEFAULT_TARGET_DONATIONS: i64 = 600_000;
pub const DEFAULT_TARGET_LIVES: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StatsTargets {
    #[cfg_attr(feature = "db", sqlx(rename = "target_donors"))]
    pub donors: i64,
    #[cfg_attr(feature = "db", sqlx(rename = "target_donations"))]
    pub donations: i64,
    #[cfg_attr(feature = "db", sqlx(rename = "target_lives"))]
    pub lives: i64,
}

impl Default for StatsTargets {
    fn default() -> Self {
        Self {
            donors: DEFAULT_TARGET_DONORS,
            donations: DEFAULT_TARGET_DONATIONS,
            lives: DEFAULT_TARGET_LIVES,
        }
    }
}

/// Stored stats row (`key = "global"`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub key: String,
    pub donors: i64,
    pub donations: i64,
    pub lives: i64,
    pub districts: i64,
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub targets: StatsTargets,
    pub updated_at: i64,
}

/// Which estimators produced the figures (non-production only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDebug {
    pub donations_method: String,
    pub donations_count_computed: i64,
    pub successful_method: Option<String>,
}

/// Payload of `GET /api/stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_users: i64,
    pub donors: i64,
    pub donations: i64,
    pub lives: i64,
    pub districts: i64,
    pub divisions: i64,
    pub searches: i64,
    pub successful_requests: i64,
    pub targets: StatsTargets,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<StatsDebug>,
}

/// Figures pushed to live subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStats {
    pub donors: i64,
    pub donations: i64,
    pub lives: i64,
    pub districts: i64,
    pub targets: StatsTargets,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsTargetsPatch {
    pub donors: Option<i64>,
    pub donations: Option<i64>,
    pub lives: Option<i64>,
}

/// Admin update of the stored stats row
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsUpdate {
    pub donors: Option<i64>,
    pub donations: Option<i64>,
    pub lives: Option<i64>,
    pub districts: Option<i64>,
    pub targets: Option<StatsTargetsPatch>,
}
