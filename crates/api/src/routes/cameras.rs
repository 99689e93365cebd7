use axum::routing::get;
use axum::Router;

use crate::handlers::cameras;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cameras::list).post(cameras::create))
        .route(
            "/{id}",
            get(cameras::get_by_id)
                .put(cameras::update)
                .delete(cameras::delete),
        )
}
