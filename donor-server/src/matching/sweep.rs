//! Re-enable sweep
//!
//! Donors whose `disabled_until` has passed get `want_to_donate` back. One
//! bulk conditional update; running it twice changes nothing the second
//! time.

use chrono::{Local, NaiveTime};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use super::MatchError;
use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::db::repository::donor;
use crate::stats::StatsHub;
use crate::utils::time::until_next_daily;

/// Restore every donor whose cooldown ended at or before `now`
pub async fn run_sweep(pool: &SqlitePool, now: i64) -> Result<u64, MatchError> {
    Ok(donor::reenable_expired(pool, now).await?)
}

async fn sweep_once(pool: &SqlitePool, stats_hub: &StatsHub) {
    match run_sweep(pool, shared::util::now_millis()).await {
        Ok(0) => tracing::debug!("Re-enable sweep: nothing due"),
        Ok(count) => {
            tracing::info!(count, "Re-enabled donors after cooldown");
            stats_hub.mark_stale();
        }
        Err(e) => tracing::error!(error = %e, "Re-enable sweep failed"),
    }
}

async fn daily_loop(pool: SqlitePool, stats_hub: StatsHub, at: NaiveTime, shutdown: CancellationToken) {
    loop {
        let wait = until_next_daily(&Local::now(), at);
        tracing::debug!(next_in_secs = wait.as_secs(), "Re-enable sweep scheduled");
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("Re-enable sweep stopped");
                break;
            }
            _ = tokio::time::sleep(wait) => {
                sweep_once(&pool, &stats_hub).await;
            }
        }
    }
}

/// Register the startup pass and the daily pass
pub fn register(tasks: &mut BackgroundTasks, config: &Config, pool: SqlitePool, stats_hub: StatsHub) {
    if config.sweep_on_startup {
        let pool = pool.clone();
        let hub = stats_hub.clone();
        tasks.spawn("donor_sweep_startup", TaskKind::Warmup, async move {
            sweep_once(&pool, &hub).await;
        });
    }

    let shutdown = tasks.shutdown_token();
    tasks.spawn(
        "donor_sweep_daily",
        TaskKind::Periodic,
        daily_loop(pool, stats_hub, config.sweep_at, shutdown),
    );
    tracing::info!(at = %config.sweep_at.format("%H:%M"), "Daily re-enable sweep registered");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::matching::availability;
    use shared::models::DonorCreate;

    async fn seed(pool: &SqlitePool, email: &str) -> i64 {
        donor::create(
            pool,
            DonorCreate {
                name: "D".into(),
                email: email.into(),
                phone: None,
                blood_group: "O+".into(),
                division: String::new(),
                district: String::new(),
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
    async fn test_sweep_is_idempotent() {
        let pool = test_pool().await;
        let now = shared::util::now_millis();
        let due = seed(&pool, "due@example.com").await;
        availability::disable(&pool, due, Some(now - 1_000)).await.unwrap();

        assert_eq!(run_sweep(&pool, now).await.unwrap(), 1);
        assert_eq!(run_sweep(&pool, now).await.unwrap(), 0);

        let donor = donor::find_by_id(&pool, due).await.unwrap().unwrap();
        assert!(donor.want_to_donate);
        assert_eq!(donor.disabled_until, None);
    }

    #[tokio::test]
    async fn test_sweep_skips_indefinite_and_future() {
        let pool = test_pool().await;
        let now = shared::util::now_millis();
        let future = seed(&pool, "future@example.com").await;
        let indefinite = seed(&pool, "off@example.com").await;
        availability::disable(&pool, future, Some(now + 60_000)).await.unwrap();
        availability::disable(&pool, indefinite, None).await.unwrap();

        assert_eq!(run_sweep(&pool, now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_spawns_and_stops() {
        let pool = test_pool().await;
        let hub = StatsHub::new(pool.clone());
        let mut config = Config::default();
        config.sweep_on_startup = true;

        let mut tasks = BackgroundTasks::new();
        register(&mut tasks, &config, pool, hub);
        assert_eq!(tasks.len(), 2);
        tasks.shutdown(std::time::Duration::from_secs(2)).await;
    }
}
