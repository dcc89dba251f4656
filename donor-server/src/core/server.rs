//! Server Implementation
//!
//! HTTP server startup and graceful shutdown

use std::time::Duration;

use tokio::net::TcpListener;

use crate::api;
use crate::core::{BackgroundTasks, Config, Result, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let mut tasks = BackgroundTasks::new();
        state.start_background_tasks(&mut tasks);

        let app = api::build_app(&state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Donor server listening on {}", addr);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        state.stats_hub.close();
        tasks
            .shutdown(Duration::from_millis(self.config.shutdown_timeout_ms))
            .await;
        state.pool.close().await;

        served?;
        tracing::info!("Server stopped");
        Ok(())
    }
}
