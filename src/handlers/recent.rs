use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::communities::find_community;
use crate::{
    AppState,
    auth::MemberUser,
    error::{AppError, AppResult},
    models::RecentCommunity,
};

pub const DEFAULT_RECENT_LIMIT: i64 = 10;
pub const MAX_RECENT_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// Number of entries, 1..=50 (default 10).
    pub limit: Option<i64>,
}

/// record_visit
///
/// [Member Route] Records (or refreshes) a visit to a community.
#[utoipa::path(
    put,
    path = "/me/recent-communities/{community_id}",
    tag = "me",
    params(("community_id" = Uuid, Path, description = "Community id")),
    responses(
        (status = 200, description = "Visit recorded", body = RecentCommunity),
        (status = 404, description = "Community not found")
    )
)]
pub async fn record_visit(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
) -> AppResult<Json<RecentCommunity>> {
    find_community(&state, community_id).await?;
    let visit = state
        .repo
        .touch_recent_community(user.id, community_id)
        .await?;
    Ok(Json(visit))
}

/// list_recent
///
/// [Member Route] Most recently visited communities first. Deleted communities are skipped.
#[utoipa::path(
    get,
    path = "/me/recent-communities",
    tag = "me",
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent communities", body = [RecentCommunity]),
        (status = 400, description = "limit out of range")
    )
)]
pub async fn list_recent(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<RecentCommunity>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    if !(1..=MAX_RECENT_LIMIT).contains(&limit) {
        return Err(AppError::validation(format!(
            "limit must be between 1 and {MAX_RECENT_LIMIT}"
        )));
    }
    Ok(Json(
        state.repo.list_recent_communities(user.id, limit).await?,
    ))
}

/// forget_visit
///
/// [Member Route] Drops one community from the caller's recent list.
#[utoipa::path(
    delete,
    path = "/me/recent-communities/{community_id}",
    tag = "me",
    params(("community_id" = Uuid, Path, description = "Community id")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Not in the recent list")
    )
)]
pub async fn forget_visit(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state
        .repo
        .delete_recent_community(user.id, community_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("recent community"))
    }
}
