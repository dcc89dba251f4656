//! Stats API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/stats | GET | none |
//! | /api/stats | PATCH | admin |
//! | /api/stats/ws | GET (upgrade) | none |

mod handler;
mod ws;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/stats", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get).patch(handler::update))
        .route("/ws", get(ws::handle_stats_ws))
}
