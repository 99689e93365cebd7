use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::faces::{self, MAX_FACE_IMAGE_BYTES};
use crate::state::AppState;

/// Room for the multipart framing and text fields around the image.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// ```text
/// POST   /                -> upload
/// GET    /{person_hash}   -> list_for_person
/// DELETE /image/{id}      -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(faces::upload).layer(DefaultBodyLimit::max(
                MAX_FACE_IMAGE_BYTES + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .route("/{person_hash}", get(faces::list_for_person))
        .route("/image/{id}", delete(faces::delete))
}
