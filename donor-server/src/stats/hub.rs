//! StatsHub - live stats fan-out
//!
//! ```text
//! acceptance / sweep
//!       │ mark_stale()
//!       ▼
//! StatsHub ── no subscribers? ──► no-op
//!       │ compute_live_stats
//!       ▼
//! broadcast::Sender<StatsBroadcast> ──► /api/stats/ws clients
//! ```

use std::sync::Arc;

use serde::Serialize;
use shared::models::LiveStats;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::service::compute_live_stats;

/// Enough to absorb a burst of acceptances between client reads
const BROADCAST_CAPACITY: usize = 32;

pub const STATS_EVENT: &str = "statsUpdate";

/// One frame sent to live subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsBroadcast {
    pub event: &'static str,
    pub data: LiveStats,
}

pub struct StatsSubscription {
    pub rx: broadcast::Receiver<StatsBroadcast>,
    /// Cancelled when the hub closes
    pub closed: CancellationToken,
}

struct HubInner {
    pool: SqlitePool,
    tx: broadcast::Sender<StatsBroadcast>,
    closed: CancellationToken,
}

#[derive(Clone)]
pub struct StatsHub {
    inner: Arc<HubInner>,
}

impl StatsHub {
    pub fn new(pool: SqlitePool) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(HubInner {
                pool,
                tx,
                closed: CancellationToken::new(),
            }),
        }
    }

    /// `None` once the hub is closed
    pub fn subscribe(&self) -> Option<StatsSubscription> {
        if self.inner.closed.is_cancelled() {
            return None;
        }
        Some(StatsSubscription {
            rx: self.inner.tx.subscribe(),
            closed: self.inner.closed.clone(),
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Figures changed. Recompute and push in the background, but only if
    /// someone is listening.
    pub fn mark_stale(&self) {
        if self.is_closed() || self.subscriber_count() == 0 {
            return;
        }
        let hub = self.clone();
        tokio::spawn(async move {
            hub.refresh().await;
        });
    }

    /// Recompute and publish now; returns how many subscribers got it
    pub async fn refresh(&self) -> usize {
        match compute_live_stats(&self.inner.pool).await {
            Ok(stats) => self.publish(stats),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to compute live stats");
                0
            }
        }
    }

    pub fn publish(&self, stats: LiveStats) -> usize {
        if self.is_closed() {
            return 0;
        }
        // send fails only when nobody is subscribed
        self.inner
            .tx
            .send(StatsBroadcast {
                event: STATS_EVENT,
                data: stats,
            })
            .unwrap_or(0)
    }

    /// Stop accepting subscribers and tell current ones to disconnect
    pub fn close(&self) {
        self.inner.closed.cancel();
        tracing::info!("Stats hub closed");
    }
}
