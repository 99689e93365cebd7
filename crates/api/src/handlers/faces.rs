//! Handlers for face image upload, listing and deletion.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use manta_core::error::CoreError;
use manta_core::types::DbId;
use manta_db::models::face_image::{CreateFaceImage, FaceImage};
use manta_db::repositories::{CameraRepo, FaceImageRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ApiKeyAuth;
use crate::query::PaginationParams;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;
use crate::storage::face_object_key;

/// Largest accepted face image (5 MiB).
pub const MAX_FACE_IMAGE_BYTES: usize = 5 * 1024 * 1024;

struct UploadedFile {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large();
    }
    AppError::BadRequest(err.body_text())
}

fn too_large() -> AppError {
    AppError::PayloadTooLarge(format!(
        "Face image must not exceed {} bytes",
        MAX_FACE_IMAGE_BYTES
    ))
}

fn required(field: &str, value: Option<String>) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing required '{field}' field")))
}

/// POST /api/v1/faces
///
/// Multipart form with `person_hash`, `camera_id` and the image in `file`
/// (`image` is accepted too). The blob is removed again if the row cannot be
/// written.
pub async fn upload(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<FaceImage>>)> {
    let mut person_hash = None;
    let mut camera_id = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "person_hash" => person_hash = Some(field.text().await.map_err(multipart_error)?),
            "camera_id" => camera_id = Some(field.text().await.map_err(multipart_error)?),
            "file" | "image" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let person_hash = required("person_hash", person_hash)?;
    let camera_id = required("camera_id", camera_id)?;
    let file = file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    if file.bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    if file.bytes.len() > MAX_FACE_IMAGE_BYTES {
        return Err(too_large());
    }

    CameraRepo::find(&state.pool, &camera_id, auth.organization_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Camera", &camera_id)))?;

    let key = face_object_key(auth.organization_id, &person_hash, file.filename.as_deref());
    let image_url = state
        .blob_store
        .put(&key, file.bytes, file.content_type.as_deref())
        .await?;

    let input = CreateFaceImage {
        person_hash,
        organization_id: auth.organization_id,
        camera_id,
        image_url,
        thumbnail_url: None,
        storage_key: key.clone(),
    };

    let face = match FaceImageRepo::create(&state.pool, &input).await {
        Ok(face) => face,
        Err(e) => {
            if let Err(cleanup) = state.blob_store.delete(&key).await {
                tracing::warn!(error = %cleanup, key = %key, "Failed to remove orphaned face image");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        face_image_id = face.id,
        person_hash = %face.person_hash,
        organization_id = face.organization_id,
        "Face image uploaded",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: face })))
}

/// GET /api/v1/faces/{person_hash}
pub async fn list_for_person(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(person_hash): Path<String>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<PaginatedResponse<FaceImage>>> {
    let page = params.page_request();
    let total =
        FaceImageRepo::count_for_person(&state.pool, &person_hash, auth.organization_id).await?;
    let data =
        FaceImageRepo::list_for_person(&state.pool, &person_hash, auth.organization_id, &page)
            .await?;
    Ok(Json(PaginatedResponse {
        data,
        pagination: page.paginate(total),
    }))
}

/// DELETE /api/v1/faces/image/{id}
///
/// The row is removed first; a failure to delete the blob is only logged.
pub async fn delete(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let face = FaceImageRepo::soft_delete(&state.pool, id, auth.organization_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("FaceImage", id)))?;

    if let Err(e) = state.blob_store.delete(&face.storage_key).await {
        tracing::warn!(error = %e, face_image_id = id, "Failed to delete face image blob");
    }
    Ok(StatusCode::NO_CONTENT)
}
