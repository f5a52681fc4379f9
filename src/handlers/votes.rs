use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use super::{comments::find_comment, posts::find_post};
use crate::{
    AppState,
    auth::MemberUser,
    error::{AppError, AppResult},
    models::{VoteRequest, VoteSummary, VoteTarget},
};

async fn ensure_target(state: &AppState, target: VoteTarget, id: Uuid) -> AppResult<()> {
    match target {
        VoteTarget::Post => find_post(state, id).await.map(|_| ()),
        VoteTarget::Comment => find_comment(state, id).await.map(|_| ()),
    }
}

async fn cast(
    state: &AppState,
    target: VoteTarget,
    target_id: Uuid,
    member_id: Uuid,
    request: VoteRequest,
) -> AppResult<VoteSummary> {
    request.validate()?;
    ensure_target(state, target, target_id).await?;
    state
        .repo
        .cast_vote(target, target_id, member_id, request.value)
        .await?;
    Ok(VoteSummary {
        target_id,
        score: state.repo.vote_score(target, target_id).await?,
        my_vote: Some(request.value),
    })
}

async fn retract(
    state: &AppState,
    target: VoteTarget,
    target_id: Uuid,
    member_id: Uuid,
) -> AppResult<VoteSummary> {
    ensure_target(state, target, target_id).await?;
    if !state.repo.remove_vote(target, target_id, member_id).await? {
        return Err(AppError::NotFound("vote"));
    }
    Ok(VoteSummary {
        target_id,
        score: state.repo.vote_score(target, target_id).await?,
        my_vote: None,
    })
}

/// vote_post
///
/// [Member Route] Casts or replaces the caller's vote on a post.
#[utoipa::path(
    put,
    path = "/posts/{id}/vote",
    tag = "votes",
    params(("id" = Uuid, Path, description = "Post id")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = VoteSummary),
        (status = 400, description = "value must be 1 or -1"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn vote_post(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> AppResult<Json<VoteSummary>> {
    Ok(Json(cast(&state, VoteTarget::Post, id, user.id, payload).await?))
}

/// unvote_post
///
/// [Member Route] Retracts the caller's vote on a post.
#[utoipa::path(
    delete,
    path = "/posts/{id}/vote",
    tag = "votes",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Vote removed", body = VoteSummary),
        (status = 404, description = "Post or vote not found")
    )
)]
pub async fn unvote_post(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VoteSummary>> {
    Ok(Json(retract(&state, VoteTarget::Post, id, user.id).await?))
}

/// vote_comment
///
/// [Member Route] Casts or replaces the caller's vote on a comment.
#[utoipa::path(
    put,
    path = "/comments/{id}/vote",
    tag = "votes",
    params(("id" = Uuid, Path, description = "Comment id")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = VoteSummary),
        (status = 400, description = "value must be 1 or -1"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn vote_comment(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> AppResult<Json<VoteSummary>> {
    Ok(Json(
        cast(&state, VoteTarget::Comment, id, user.id, payload).await?,
    ))
}

/// unvote_comment
///
/// [Member Route] Retracts the caller's vote on a comment.
#[utoipa::path(
    delete,
    path = "/comments/{id}/vote",
    tag = "votes",
    params(("id" = Uuid, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Vote removed", body = VoteSummary),
        (status = 404, description = "Comment or vote not found")
    )
)]
pub async fn unvote_comment(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VoteSummary>> {
    Ok(Json(
        retract(&state, VoteTarget::Comment, id, user.id).await?,
    ))
}
