pub mod projects;

use axum::routing::get;
use axum::Router;

use crate::state::SharedState;

/// Read-only JSON API for front ends rendering the project listing.
pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/v1/projects", get(projects::list))
        .route("/api/v1/projects/{id}", get(projects::get))
        .route("/api/v1/categories", get(projects::categories))
}
