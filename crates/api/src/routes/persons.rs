use axum::routing::get;
use axum::Router;

use crate::handlers::persons;
use crate::state::AppState;

/// ```text
/// GET    /                      -> list
/// GET    /{person_hash}         -> get_by_hash
/// DELETE /{person_hash}         -> delete
/// GET    /{person_hash}/stats   -> stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(persons::list))
        .route(
            "/{person_hash}",
            get(persons::get_by_hash).delete(persons::delete),
        )
        .route("/{person_hash}/stats", get(persons::stats))
}
