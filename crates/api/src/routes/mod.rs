pub mod api_keys;
pub mod cameras;
pub mod faces;
pub mod health;
pub mod organizations;
pub mod persons;
pub mod reports;
pub mod sync;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree. Every route except `/` needs an API key.
///
/// Route hierarchy:
///
/// ```text
/// /                                   service info
///
/// /summary                            daily summary (?date=)
/// /heatmap                            hourly heatmap (?date=)
/// /person-stats                       new vs repeat (?date=)
/// /logs                               detection log search
///
/// /organizations                      list, create (admin)
/// /organizations/{id}                 get, update, delete
///
/// /cameras                            list, create
/// /cameras/{id}                       get, update, delete
///
/// /persons                            list
/// /persons/{person_hash}              get, delete
/// /persons/{person_hash}/stats        visit stats
///
/// /faces                              upload (multipart)
/// /faces/{person_hash}                list images
/// /faces/image/{id}                   delete image
///
/// /api-keys                           list, issue
/// /api-keys/{id}                      revoke
///
/// /sync/events                        reconcile one event (admin)
/// /sync/backfill                      backfill from the feed (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::info::service_info))
        .merge(reports::router())
        .nest("/organizations", organizations::router())
        .nest("/cameras", cameras::router())
        .nest("/persons", persons::router())
        .nest("/faces", faces::router())
        .nest("/api-keys", api_keys::router())
        .nest("/sync", sync::router())
}
