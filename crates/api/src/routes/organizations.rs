use axum::routing::get;
use axum::Router;

use crate::handlers::organizations;
use crate::state::AppState;

/// ```text
/// GET    /      -> list
/// POST   /      -> create
/// GET    /{id}  -> get_by_id
/// PUT    /{id}  -> update
/// DELETE /{id}  -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(organizations::list).post(organizations::create))
        .route(
            "/{id}",
            get(organizations::get_by_id)
                .put(organizations::update)
                .delete(organizations::delete),
        )
}
