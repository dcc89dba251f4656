//! Core - configuration, state, server and background tasks
//!
//! - [`Config`] - server configuration
//! - [`ServerState`] - shared state handed to handlers
//! - [`Server`] - HTTP server
//! - [`ServerError`] - startup / runtime errors
//! - [`BackgroundTasks`] - background task registry

pub mod config;
pub mod error;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind};
