use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{BannedWord, CreateBannedWordRequest},
};

/// list_banned_words
///
/// [Admin Route] Every active banned word, alphabetically.
#[utoipa::path(
    get,
    path = "/admin/banned-words",
    tag = "admin",
    responses((status = 200, description = "Banned words", body = [BannedWord]))
)]
pub async fn list_banned_words(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<BannedWord>>> {
    Ok(Json(state.repo.list_banned_words().await?))
}

/// create_banned_word
///
/// [Admin Route] Stored lower-cased. Applies to content written after the change;
/// existing posts and comments are left as they are.
#[utoipa::path(
    post,
    path = "/admin/banned-words",
    tag = "admin",
    request_body = CreateBannedWordRequest,
    responses(
        (status = 201, description = "Created", body = BannedWord),
        (status = 409, description = "Already banned")
    )
)]
pub async fn create_banned_word(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateBannedWordRequest>,
) -> AppResult<(StatusCode, Json<BannedWord>)> {
    let payload = payload.normalize()?;
    if state
        .repo
        .get_banned_word_by_word(&payload.word)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("word is already banned"));
    }
    let word = state.repo.create_banned_word(payload.word).await?;
    tracing::info!(admin_id = %admin.id, word = %word.word, "banned word added");
    Ok((StatusCode::CREATED, Json(word)))
}

/// delete_banned_word
///
/// [Admin Route] Lifts a ban. Content rejected earlier stays rejected.
#[utoipa::path(
    delete,
    path = "/admin/banned-words/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Banned word id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_banned_word(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.repo.delete_banned_word(id).await? {
        return Err(AppError::NotFound("banned word"));
    }
    Ok(StatusCode::NO_CONTENT)
}
