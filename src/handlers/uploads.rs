use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::MemberUser,
    error::{AppError, AppResult},
    models::{PresignedUrlRequest, PresignedUrlResponse},
    storage::upload_key,
};

/// get_presigned_url
///
/// [Member Route] Generates a temporary URL for a direct client-to-bucket upload.
///
/// The URL lives for ten minutes and is constrained to `file_type`. The object key
/// is namespaced by the caller's id and made unique with a random UUID, so the
/// returned `resource_key` can be stored on a community as `logo_key` or `banner_key`.
#[utoipa::path(
    post,
    path = "/uploads/presigned",
    tag = "uploads",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 400, description = "Unsupported file type"),
        (status = 502, description = "Storage backend failed")
    )
)]
pub async fn get_presigned_url(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> AppResult<Json<PresignedUrlResponse>> {
    payload.validate()?;
    let object_key = upload_key(user.id, &payload.filename);

    let upload_url = state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, key = %object_key, "presigning failed");
            AppError::BadGateway("could not sign upload".into())
        })?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: object_key,
    }))
}
