use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{AdminDashboardStats, Member, Page, PageRequest},
};

/// MemberQuery
///
/// Filters for `GET /admin/members`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MemberQuery {
    /// Case-insensitive match on username, email or display name.
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// get_admin_stats
///
/// [Admin Route] Counts of active rows across the platform.
#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "admin",
    responses(
        (status = 200, description = "Dashboard counters", body = AdminDashboardStats),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_admin_stats(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<Json<AdminDashboardStats>> {
    Ok(Json(state.repo.get_stats().await?))
}

/// list_members
///
/// [Admin Route] Active members, newest first. `search` matches username, email or display name.
#[utoipa::path(
    get,
    path = "/admin/members",
    tag = "admin",
    params(MemberQuery),
    responses((status = 200, description = "Members", body = Page<Member>))
)]
pub async fn list_members(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
) -> AppResult<Json<Page<Member>>> {
    let page = PageRequest::from_query(query.page, query.limit)?;
    let search = query.search.filter(|s| !s.trim().is_empty());
    Ok(Json(state.repo.list_members(search, page).await?))
}

/// delete_member
///
/// [Admin Route] Soft-deletes a member account and revokes every session it holds.
#[utoipa::path(
    delete,
    path = "/admin/members/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Member id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_member(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.repo.delete_member(id).await? {
        return Err(AppError::NotFound("member"));
    }
    let revoked = state.repo.revoke_actor_sessions(id).await?;
    tracing::warn!(member_id = %id, admin_id = %admin.id, revoked, "member removed by admin");
    Ok(StatusCode::NO_CONTENT)
}
