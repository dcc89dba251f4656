//! Donor API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/donors | POST | none |
//! | /api/donors/{id} | GET | self or admin |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/donors", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::register))
        .route("/{id}", get(handler::get_by_id))
}
