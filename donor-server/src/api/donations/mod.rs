//! Donation API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/donations/request | POST | none |
//! | /api/donations/my-requests | GET | donor |
//! | /api/donations/{id}/accept | PUT | assigned donor |
//! | /api/donations/disable | PATCH | donor |
//! | /api/donations/enable | PATCH | donor |
//! | /api/donations/history | GET | donor |

mod handler;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/donations", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/request", post(handler::create_request))
        .route("/my-requests", get(handler::my_requests))
        .route("/{id}/accept", put(handler::accept))
        .route("/disable", patch(handler::disable))
        .route("/enable", patch(handler::enable))
        .route("/history", get(handler::history))
}
