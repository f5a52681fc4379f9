use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{PageQuery, banned_words, posts::find_post};
use crate::{
    AppState,
    auth::{AdminUser, MemberUser},
    error::{AppError, AppResult},
    models::{Comment, CreateCommentRequest, NewComment, Page, UpdateCommentRequest},
    moderation,
};

pub(crate) async fn find_comment(state: &AppState, id: Uuid) -> AppResult<Comment> {
    state
        .repo
        .get_comment(id)
        .await?
        .ok_or(AppError::NotFound("comment"))
}

/// list_comments
///
/// [Public Route] Comments of a post in conversation order (oldest first).
#[utoipa::path(
    get,
    path = "/posts/{id}/comments",
    tag = "comments",
    params(("id" = Uuid, Path, description = "Post id"), PageQuery),
    responses(
        (status = 200, description = "Comments", body = Page<Comment>),
        (status = 404, description = "Post not found")
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Comment>>> {
    let page = query.page_request()?;
    find_post(&state, post_id).await?;
    Ok(Json(state.repo.list_comments(post_id, page).await?))
}

/// get_comment
///
/// [Public Route] A single active comment.
#[utoipa::path(
    get,
    path = "/comments/{id}",
    tag = "comments",
    params(("id" = Uuid, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment", body = Comment),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Comment>> {
    Ok(Json(find_comment(&state, id).await?))
}

/// create_comment
///
/// [Member Route] Any member may comment. A reply's `parent_id` must name an active
/// comment on the same post.
#[utoipa::path(
    post,
    path = "/posts/{id}/comments",
    tag = "comments",
    params(("id" = Uuid, Path, description = "Post id")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Created", body = Comment),
        (status = 400, description = "Invalid body, parent or banned word"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn create_comment(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    find_post(&state, post_id).await?;
    let payload = payload.normalize()?;

    if let Some(parent_id) = payload.parent_id {
        let parent_ok = state
            .repo
            .get_comment(parent_id)
            .await?
            .is_some_and(|parent| parent.post_id == post_id);
        if !parent_ok {
            return Err(AppError::validation(
                "parent_id must reference an active comment on the same post",
            ));
        }
    }

    let banned = banned_words(&state).await?;
    moderation::screen(&[("body", payload.body.as_str())], &banned)?;

    let comment = state
        .repo
        .create_comment(NewComment {
            post_id,
            author_id: user.id,
            parent_id: payload.parent_id,
            body: payload.body,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// update_comment
///
/// [Member Route] Author-only edit of the body, screened against banned words.
#[utoipa::path(
    put,
    path = "/comments/{id}",
    tag = "comments",
    params(("id" = Uuid, Path, description = "Comment id")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_comment(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> AppResult<Json<Comment>> {
    let comment = find_comment(&state, id).await?;
    if comment.author_id != user.id {
        return Err(AppError::forbidden("only the author may edit this comment"));
    }
    let payload = payload.normalize()?;
    let banned = banned_words(&state).await?;
    moderation::screen(&[("body", payload.body.as_str())], &banned)?;

    let updated = state
        .repo
        .update_comment(id, payload.body)
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    Ok(Json(updated))
}

/// delete_comment
///
/// [Member Route] Author-only soft delete.
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    tag = "comments",
    params(("id" = Uuid, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_comment(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let comment = find_comment(&state, id).await?;
    if comment.author_id != user.id {
        return Err(AppError::forbidden("only the author may delete this comment"));
    }
    if !state.repo.delete_comment(id).await? {
        return Err(AppError::NotFound("comment"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// admin_delete_comment
///
/// [Admin Route] Removes any comment regardless of author.
#[utoipa::path(
    delete,
    path = "/admin/comments/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn admin_delete_comment(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.repo.delete_comment(id).await? {
        return Err(AppError::NotFound("comment"));
    }
    tracing::warn!(comment_id = %id, admin_id = %admin.id, "comment removed by admin");
    Ok(StatusCode::NO_CONTENT)
}
