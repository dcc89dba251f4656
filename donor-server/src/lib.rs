//! Donor Server - blood donation matching backend
//!
//! # Module layout
//!
//! ```text
//! donor-server/src/
//! ├── core/      # config, state, server, background tasks
//! ├── auth/      # JWT validation and CurrentUser extractor
//! ├── db/        # SQLite pool, migrations, repositories
//! ├── matching/  # availability, search aggregate, acceptance, history, sweep
//! ├── stats/     # donation estimators, stats service, live hub
//! ├── notify/    # fire-and-forget donor/requester notifications
//! ├── api/       # HTTP routes and handlers
//! └── utils/     # errors, logging, time, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod matching;
pub mod notify;
pub mod stats;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - accepts tracing format specifiers
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env`, initialize logging
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // Missing .env is fine
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____                          _____
   / __ \____  ____  ____  _____/ ___/___  ______   _____  _____
  / / / / __ \/ __ \/ __ \/ ___/\__ \/ _ \/ ___/ | / / _ \/ ___/
 / /_/ / /_/ / / / / /_/ / /   ___/ /  __/ /   | |/ /  __/ /
/_____/\____/_/ /_/\____/_/   /____/\___/_/    |___/\___/_/
    "#
    );
}
