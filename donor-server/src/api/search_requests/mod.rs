//! Search Request API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/search-requests | POST | none |
//! | /api/search-requests | GET | admin |
//! | /api/search-requests/latest | GET | none |
//! | /api/search-requests/{id} | GET, PATCH | none |
//! | /api/search-requests/{id}/reset | DELETE | none |
//! | /api/search-requests/browser/{browserId}/latest | GET, PUT | none |
//! | /api/search-requests/browser/{browserId}/reset | DELETE | none |
//! | /api/search-requests/donor/{donorId} | GET | self or admin |
//! | /api/search-requests/donor/{donorId}/latest | GET | self or admin |
//! | /api/search-requests/donor/{donorId}/{id}/accept | PUT | self or admin |
//! | /api/search-requests/donor/{donorId}/{id}/decline | DELETE | self or admin |
//! | /api/search-requests/donor/{donorId}/{id}/reject | PUT | self or admin |

mod handler;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/search-requests", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_all).post(handler::create))
        .route("/latest", get(handler::latest))
        .route("/{id}", get(handler::get_by_id).patch(handler::update))
        .route("/{id}/reset", delete(handler::reset))
        // Browser-keyed
        .route(
            "/browser/{browser_id}/latest",
            get(handler::latest_for_browser).put(handler::update_latest_for_browser),
        )
        .route("/browser/{browser_id}/reset", delete(handler::reset_for_browser))
        // Donor-scoped
        .route("/donor/{donor_id}", get(handler::list_for_donor))
        .route("/donor/{donor_id}/latest", get(handler::latest_for_donor))
        .route("/donor/{donor_id}/{id}/accept", put(handler::accept))
        .route("/donor/{donor_id}/{id}/decline", delete(handler::decline))
        .route("/donor/{donor_id}/{id}/reject", put(handler::reject))
}
