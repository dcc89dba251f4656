//! Donor availability
//!
//! A donor is reachable while `want_to_donate` is true. A disable may carry
//! a `disabled_until` deadline, after which the sweep restores the donor;
//! without one the disable is indefinite.

use shared::models::Donor;
use sqlx::SqlitePool;

use super::MatchError;
use crate::db::repository::{RepoError, donor};
use crate::utils::time::{add_calendar_months, add_days};

/// How long a donor rests after an acceptance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooldown {
    /// Calendar months in UTC; a day past the target month's end rolls over
    CalendarMonths(u32),
    /// Exactly `n * 24h`
    FixedDays(i64),
}

impl Cooldown {
    /// End of the cooldown counted from `from` (Unix millis)
    pub fn until(&self, from: i64) -> Result<i64, MatchError> {
        let until = match *self {
            Cooldown::CalendarMonths(months) => add_calendar_months(from, months),
            Cooldown::FixedDays(days) => add_days(from, days),
        };
        until.ok_or_else(|| {
            MatchError::Validation(format!("Cooldown {self:?} from {from} is out of range"))
        })
    }
}

pub(crate) fn donor_error(id: i64) -> impl FnOnce(RepoError) -> MatchError {
    move |e| match e {
        RepoError::NotFound(_) => MatchError::DonorNotFound(id),
        other => MatchError::Repo(other),
    }
}

async fn reload(pool: &SqlitePool, id: i64) -> Result<Donor, MatchError> {
    donor::find_by_id(pool, id)
        .await?
        .ok_or(MatchError::DonorNotFound(id))
}

/// Stop offering the donor. `None` disables indefinitely and clears any
/// previous deadline.
pub async fn disable(pool: &SqlitePool, donor_id: i64, until: Option<i64>) -> Result<Donor, MatchError> {
    let now = shared::util::now_millis();
    donor::set_availability(pool, donor_id, false, until, now)
        .await
        .map_err(donor_error(donor_id))?;
    tracing::info!(donor_id = %donor_id, disabled_until = ?until, "Donor disabled");
    reload(pool, donor_id).await
}

/// Manual disable for `duration_days` from now, or indefinitely
pub async fn disable_for_days(
    pool: &SqlitePool,
    donor_id: i64,
    duration_days: Option<i64>,
) -> Result<Donor, MatchError> {
    let until = match duration_days {
        Some(days) => Some(Cooldown::FixedDays(days).until(shared::util::now_millis())?),
        None => None,
    };
    disable(pool, donor_id, until).await
}

pub async fn enable(pool: &SqlitePool, donor_id: i64) -> Result<Donor, MatchError> {
    let now = shared::util::now_millis();
    donor::set_availability(pool, donor_id, true, None, now)
        .await
        .map_err(donor_error(donor_id))?;
    tracing::info!(donor_id = %donor_id, "Donor enabled");
    reload(pool, donor_id).await
}

/// Disable until the cooldown counted from `from` has elapsed
pub async fn disable_for_cooldown(
    pool: &SqlitePool,
    donor_id: i64,
    from: i64,
    cooldown: Cooldown,
) -> Result<Donor, MatchError> {
    let until = cooldown.until(from)?;
    disable(pool, donor_id, Some(until)).await
}
