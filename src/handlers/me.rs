use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AuthUser, MemberUser},
    error::{AppError, AppResult},
    models::{Member, MeResponse, Role, Session, UpdateProfileRequest},
};

/// get_me
///
/// [Authenticated Route] Describes the caller. Guests only have an id and role.
#[utoipa::path(
    get,
    path = "/me",
    tag = "me",
    responses(
        (status = 200, description = "Caller profile", body = MeResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_me(user: AuthUser, State(state): State<AppState>) -> AppResult<Json<MeResponse>> {
    let me = match user.role {
        Role::Guest => MeResponse {
            id: user.id,
            role: user.role,
            email: None,
            username: None,
            display_name: None,
        },
        Role::Member => {
            let member = state
                .repo
                .get_member(user.id)
                .await?
                .ok_or(AppError::Unauthorized)?;
            MeResponse {
                id: member.id,
                role: user.role,
                email: Some(member.email),
                username: Some(member.username),
                display_name: member.display_name,
            }
        }
        Role::Admin => {
            let admin = state
                .repo
                .get_admin(user.id)
                .await?
                .ok_or(AppError::Unauthorized)?;
            MeResponse {
                id: admin.id,
                role: user.role,
                email: Some(admin.email),
                username: None,
                display_name: Some(admin.display_name),
            }
        }
    };
    Ok(Json(me))
}

/// update_profile
///
/// [Member Route] Sets or clears the member's display name.
#[utoipa::path(
    put,
    path = "/me/profile",
    tag = "me",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated member", body = Member))
)]
pub async fn update_profile(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<Member>> {
    let payload = payload.normalize()?;
    let member = state
        .repo
        .update_member_profile(user.id, payload.display_name)
        .await?
        .ok_or(AppError::NotFound("member"))?;
    Ok(Json(member))
}

/// delete_me
///
/// [Member Route] Soft-deletes the caller's account and revokes every session it holds.
#[utoipa::path(
    delete,
    path = "/me",
    tag = "me",
    responses((status = 204, description = "Account deleted"))
)]
pub async fn delete_me(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
) -> AppResult<StatusCode> {
    if !state.repo.delete_member(user.id).await? {
        return Err(AppError::NotFound("member"));
    }
    let revoked = state.repo.revoke_actor_sessions(user.id).await?;
    tracing::info!(member_id = %user.id, revoked, "member deleted own account");
    Ok(StatusCode::NO_CONTENT)
}

/// list_sessions
///
/// [Authenticated Route] The caller's active sessions, newest first.
#[utoipa::path(
    get,
    path = "/me/sessions",
    tag = "me",
    responses((status = 200, description = "Active sessions", body = [Session]))
)]
pub async fn list_sessions(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Session>>> {
    Ok(Json(state.repo.list_sessions(user.id).await?))
}

/// revoke_session
///
/// [Authenticated Route] Ends one of the caller's sessions (for example a lost device).
#[utoipa::path(
    delete,
    path = "/me/sessions/{id}",
    tag = "me",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 404, description = "No such active session")
    )
)]
pub async fn revoke_session(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.repo.revoke_session(id, user.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("session"))
    }
}
