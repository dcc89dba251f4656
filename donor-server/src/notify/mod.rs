//! Donation notifications
//!
//! Acceptance and withdrawal events are handed to a [`Notifier`] after the
//! write has committed. Delivery never blocks or fails the request that
//! produced the event.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DonationEvent {
    /// Donor accepted a search request
    Accepted {
        search_request_id: i64,
        donor_id: i64,
        donation_id: i64,
        scheduled_at: i64,
    },
    Declined {
        search_request_id: i64,
        donor_id: i64,
    },
    Rejected {
        search_request_id: i64,
        donor_id: i64,
    },
    /// Donor accepted a legacy donation request
    LegacyAccepted {
        request_id: i64,
        donor_id: i64,
    },
}

impl DonationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Declined { .. } => "declined",
            Self::Rejected { .. } => "rejected",
            Self::LegacyAccepted { .. } => "legacy_accepted",
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &DonationEvent) -> Result<(), NotifyError>;
}

/// Writes every event as a structured log record
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &DonationEvent) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(event)
            .map_err(|e| NotifyError::Unavailable(e.to_string()))?;
        tracing::info!(target: "notify", event = event.name(), payload = %payload, "Donation event");
        Ok(())
    }
}

/// Fire-and-forget delivery
pub fn dispatch(notifier: Arc<dyn Notifier>, event: DonationEvent) {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&event).await {
            tracing::warn!(event = event.name(), error = %e, "Notification delivery failed");
        }
    });
}
