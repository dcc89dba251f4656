//! Platform statistics
//!
//! - [`estimators`] - prioritized donation-count estimators
//! - [`service`] - computed snapshot, admin updates, live figures
//! - [`hub`] - live stats broadcast to WebSocket subscribers

pub mod estimators;
pub mod hub;
pub mod service;

pub use estimators::{DonationEstimate, DonationEstimator};
pub use hub::{StatsBroadcast, StatsHub, StatsSubscription};
