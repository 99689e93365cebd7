use axum::routing::post;
use axum::Router;

use crate::handlers::sync;
use crate::state::AppState;

/// ```text
/// POST /events    -> reconcile_event
/// POST /backfill  -> backfill
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", post(sync::reconcile_event))
        .route("/backfill", post(sync::backfill))
}
