use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{PageQuery, communities::find_community};
use crate::{
    AppState,
    auth::MemberUser,
    error::{AppError, AppResult},
    models::{Membership, Page},
};

/// join_community
///
/// [Member Route] Adds the caller to a community.
#[utoipa::path(
    post,
    path = "/communities/{id}/memberships",
    tag = "memberships",
    params(("id" = Uuid, Path, description = "Community id")),
    responses(
        (status = 201, description = "Joined", body = Membership),
        (status = 404, description = "Community not found"),
        (status = 409, description = "Already a member")
    )
)]
pub async fn join_community(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Membership>)> {
    find_community(&state, community_id).await?;
    if state
        .repo
        .get_membership(community_id, user.id)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("already a member of this community"));
    }
    let membership = state.repo.create_membership(community_id, user.id).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

/// leave_community
///
/// [Member Route] Removes the caller's membership. Owners cannot leave their own community.
#[utoipa::path(
    delete,
    path = "/communities/{id}/memberships",
    tag = "memberships",
    params(("id" = Uuid, Path, description = "Community id")),
    responses(
        (status = 204, description = "Left"),
        (status = 403, description = "Owner cannot leave"),
        (status = 404, description = "Community not found or not a member")
    )
)]
pub async fn leave_community(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let community = find_community(&state, community_id).await?;
    if community.owner_id == user.id {
        return Err(AppError::forbidden("the owner cannot leave the community"));
    }
    if !state.repo.delete_membership(community_id, user.id).await? {
        return Err(AppError::NotFound("membership"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// list_community_memberships
///
/// [Public Route] Members of a community, oldest membership first.
#[utoipa::path(
    get,
    path = "/communities/{id}/memberships",
    tag = "memberships",
    params(("id" = Uuid, Path, description = "Community id"), PageQuery),
    responses(
        (status = 200, description = "Memberships", body = Page<Membership>),
        (status = 404, description = "Community not found")
    )
)]
pub async fn list_community_memberships(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Membership>>> {
    let page = query.page_request()?;
    find_community(&state, community_id).await?;
    Ok(Json(
        state
            .repo
            .list_community_memberships(community_id, page)
            .await?,
    ))
}

/// list_my_memberships
///
/// [Member Route] The caller's memberships in active communities, newest first.
#[utoipa::path(
    get,
    path = "/me/memberships",
    tag = "memberships",
    params(PageQuery),
    responses((status = 200, description = "Caller's memberships", body = Page<Membership>))
)]
pub async fn list_my_memberships(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Membership>>> {
    let page = query.page_request()?;
    Ok(Json(state.repo.list_member_memberships(user.id, page).await?))
}
