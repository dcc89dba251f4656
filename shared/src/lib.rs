//! Shared types for the donor platform
//!
//! Wire models, the unified error system and small utilities used by the
//! server and by its tests.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
