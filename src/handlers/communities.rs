use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::banned_words;
use crate::{
    AppState,
    auth::{AdminUser, MemberUser},
    error::{AppError, AppResult},
    models::{
        Community, CommunityFilter, CreateCommunityRequest, NewCommunity, Page, PageRequest,
        UpdateCommunityRequest,
    },
    moderation,
};

/// CommunityQuery
///
/// Query parameters for `GET /communities`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommunityQuery {
    /// Case-insensitive match on name or title.
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Loads an active community or fails with 404.
pub(crate) async fn find_community(state: &AppState, id: Uuid) -> AppResult<Community> {
    state
        .repo
        .get_community(id)
        .await?
        .ok_or(AppError::NotFound("community"))
}

async fn ensure_category(state: &AppState, category_id: Option<Uuid>) -> AppResult<()> {
    if let Some(id) = category_id {
        if state.repo.get_category(id).await?.is_none() {
            return Err(AppError::validation(
                "category_id does not name an existing category",
            ));
        }
    }
    Ok(())
}

/// list_communities
///
/// [Public Route] Newest first, optionally filtered by category and a search term.
#[utoipa::path(
    get,
    path = "/communities",
    tag = "communities",
    params(CommunityQuery),
    responses((status = 200, description = "Communities", body = Page<Community>))
)]
pub async fn list_communities(
    State(state): State<AppState>,
    Query(query): Query<CommunityQuery>,
) -> AppResult<Json<Page<Community>>> {
    let page = PageRequest::from_query(query.page, query.limit)?;
    let filter = CommunityFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        category_id: query.category_id,
    };
    Ok(Json(state.repo.list_communities(filter, page).await?))
}

/// get_community
///
/// [Public Route] A single active community with its member count.
#[utoipa::path(
    get,
    path = "/communities/{id}",
    tag = "communities",
    params(("id" = Uuid, Path, description = "Community id")),
    responses(
        (status = 200, description = "Community", body = Community),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_community(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Community>> {
    Ok(Json(find_community(&state, id).await?))
}

/// create_community
///
/// [Member Route] Creates a community owned by the caller, who also becomes its
/// first member. The handle-style `name` is unique among active communities.
#[utoipa::path(
    post,
    path = "/communities",
    tag = "communities",
    request_body = CreateCommunityRequest,
    responses(
        (status = 201, description = "Created", body = Community),
        (status = 400, description = "Invalid input or banned word"),
        (status = 409, description = "Name taken")
    )
)]
pub async fn create_community(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCommunityRequest>,
) -> AppResult<(StatusCode, Json<Community>)> {
    let payload = payload.normalize()?;
    let banned = banned_words(&state).await?;
    moderation::screen(
        &[
            ("title", payload.title.as_str()),
            ("description", payload.description.as_deref().unwrap_or("")),
        ],
        &banned,
    )?;
    ensure_category(&state, payload.category_id).await?;
    if state.repo.get_community_by_name(&payload.name).await?.is_some() {
        return Err(AppError::conflict("community name is already taken"));
    }

    let community = state
        .repo
        .create_community(NewCommunity {
            name: payload.name,
            title: payload.title,
            description: payload.description,
            category_id: payload.category_id,
            owner_id: user.id,
        })
        .await?;
    tracing::info!(community_id = %community.id, owner_id = %user.id, "community created");
    Ok((StatusCode::CREATED, Json(community)))
}

/// update_community
///
/// [Member Route] Owner-only partial update.
#[utoipa::path(
    put,
    path = "/communities/{id}",
    tag = "communities",
    params(("id" = Uuid, Path, description = "Community id")),
    request_body = UpdateCommunityRequest,
    responses(
        (status = 200, description = "Updated", body = Community),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_community(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCommunityRequest>,
) -> AppResult<Json<Community>> {
    let community = find_community(&state, id).await?;
    if community.owner_id != user.id {
        return Err(AppError::forbidden("only the owner may edit this community"));
    }

    let payload = payload.normalize()?;
    let banned = banned_words(&state).await?;
    moderation::screen(
        &[
            ("title", payload.title.as_deref().unwrap_or("")),
            ("description", payload.description.as_deref().unwrap_or("")),
        ],
        &banned,
    )?;
    ensure_category(&state, payload.category_id).await?;

    let updated = state
        .repo
        .update_community(id, payload)
        .await?
        .ok_or(AppError::NotFound("community"))?;
    Ok(Json(updated))
}

/// delete_community
///
/// [Member Route] Owner-only soft delete. Posts and comments of the community
/// disappear with it.
#[utoipa::path(
    delete,
    path = "/communities/{id}",
    tag = "communities",
    params(("id" = Uuid, Path, description = "Community id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_community(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let community = find_community(&state, id).await?;
    if community.owner_id != user.id {
        return Err(AppError::forbidden("only the owner may delete this community"));
    }
    if !state.repo.delete_community(id).await? {
        return Err(AppError::NotFound("community"));
    }
    tracing::info!(community_id = %id, owner_id = %user.id, "community deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// admin_delete_community
///
/// [Admin Route] Force soft delete, no ownership check.
#[utoipa::path(
    delete,
    path = "/admin/communities/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Community id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn admin_delete_community(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.repo.delete_community(id).await? {
        return Err(AppError::NotFound("community"));
    }
    tracing::warn!(community_id = %id, admin_id = %admin.id, "community removed by admin");
    Ok(StatusCode::NO_CONTENT)
}
