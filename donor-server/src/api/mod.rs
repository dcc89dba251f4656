//! HTTP API
//!
//! | Module | Prefix | Auth |
//! |--------|--------|------|
//! | health | /health | public |
//! | donors | /api/donors | register public, profile self/admin |
//! | search_requests | /api/search-requests | donor routes self/admin |
//! | donations | /api/donations | legacy create public, rest authenticated |
//! | stats | /api/stats | read public, update admin |

use axum::Router;
use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

pub mod donations;
pub mod donors;
pub mod health;
pub mod search_requests;
pub mod stats;

/// All routes, no middleware
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(donors::router())
        .merge(search_requests::router())
        .merge(donations::router())
        .merge(stats::router())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Router with middleware and state, used by the server and by tests
pub fn build_app(state: &ServerState) -> Router {
    build_router()
        .layer(cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone())
}
