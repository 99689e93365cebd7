//! Report and log routes, mounted at the root of `/api/v1`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{logs, reports};
use crate::state::AppState;

/// ```text
/// GET /summary       -> daily_summary
/// GET /heatmap       -> heatmap
/// GET /person-stats  -> person_stats
/// GET /logs          -> search
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(reports::daily_summary))
        .route("/heatmap", get(reports::heatmap))
        .route("/person-stats", get(reports::person_stats))
        .route("/logs", get(logs::search))
}
