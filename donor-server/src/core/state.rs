//! Server state
//!
//! | Field | Type | Meaning |
//! |-------|------|---------|
//! | config | Config | immutable configuration |
//! | pool | SqlitePool | SQLite connection pool |
//! | jwt_service | Arc<JwtService> | bearer token validation |
//! | stats_hub | StatsHub | live stats broadcast |
//! | notifier | Arc<dyn Notifier> | donation event delivery |

use std::path::Path;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::{BackgroundTasks, Config, Result, ServerError};
use crate::db::DbService;
use crate::matching::sweep;
use crate::notify::{LogNotifier, Notifier};
use crate::stats::StatsHub;

/// Shared handles every handler gets. Cloning is cheap.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub stats_hub: StatsHub,
    pub notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("environment", &self.config.environment)
            .field("http_port", &self.config.http_port)
            .field("subscribers", &self.stats_hub.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// Open storage and build the services
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        if let Some(parent) = Path::new(&config.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let db = DbService::new(&config.database_path)
            .await
            .map_err(|e| ServerError::Database(e.message))?;

        Ok(Self::for_pool(config.clone(), db.pool))
    }

    /// Build state around an existing pool (tests, tooling)
    pub fn for_pool(config: Config, pool: SqlitePool) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let stats_hub = StatsHub::new(pool.clone());
        Self {
            config,
            pool,
            jwt_service,
            stats_hub,
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Swap the notifier
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Register the re-enable sweep
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        sweep::register(tasks, &self.config, self.pool.clone(), self.stats_hub.clone());
        tasks.log_summary();
    }
}
