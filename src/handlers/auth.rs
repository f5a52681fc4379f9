use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{MethodRouter, post},
};

use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{AppError, AppResult},
    models::{
        AdminAuthorized, AdminJoinRequest, GuestAuthorized, LoginRequest, MemberAuthorized,
        MemberJoinRequest, NewAdmin, NewMember, RefreshRequest, Role, TokenPair,
    },
};

/// guest_join
///
/// [Public Route] Creates an anonymous guest and opens a session for it.
#[utoipa::path(
    post,
    path = "/auth/guest/join",
    tag = "auth",
    responses((status = 201, description = "Guest created", body = GuestAuthorized))
)]
pub async fn guest_join(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<(StatusCode, Json<GuestAuthorized>)> {
    let guest = state.repo.create_guest().await?;
    let token = auth::start_session(
        &state.repo,
        &state.config,
        Role::Guest,
        guest.id,
        auth::user_agent(&headers),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(GuestAuthorized { guest, token })))
}

/// member_join
///
/// [Public Route] Registers a member account. Email and username are normalized
/// to lower case and must both be unused.
#[utoipa::path(
    post,
    path = "/auth/member/join",
    tag = "auth",
    request_body = MemberJoinRequest,
    responses(
        (status = 201, description = "Member registered", body = MemberAuthorized),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or username already taken")
    )
)]
pub async fn member_join(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MemberJoinRequest>,
) -> AppResult<(StatusCode, Json<MemberAuthorized>)> {
    let payload = payload.normalize()?;

    if state
        .repo
        .get_member_account_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("email is already registered"));
    }
    if state
        .repo
        .get_member_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("username is already taken"));
    }

    let password_hash =
        auth::hash_password(payload.password, state.config.password_memory_kib).await?;
    let member = state
        .repo
        .create_member(NewMember {
            email: payload.email,
            username: payload.username,
            display_name: payload.display_name,
            password_hash,
        })
        .await?;
    tracing::info!(member_id = %member.id, "member joined");

    let token = auth::start_session(
        &state.repo,
        &state.config,
        Role::Member,
        member.id,
        auth::user_agent(&headers),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(MemberAuthorized { member, token })))
}

/// member_login
///
/// [Public Route] Exchanges member credentials for a new session. Unknown emails
/// and wrong passwords are indistinguishable.
#[utoipa::path(
    post,
    path = "/auth/member/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = MemberAuthorized),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn member_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<MemberAuthorized>> {
    let email = payload.email.trim().to_lowercase();
    let Some(account) = state.repo.get_member_account_by_email(&email).await? else {
        return Err(AppError::Unauthorized);
    };
    if !auth::verify_password(payload.password, account.password_hash).await {
        tracing::info!(member_id = %account.member.id, "member login rejected");
        return Err(AppError::Unauthorized);
    }

    let member = account.member;
    let token = auth::start_session(
        &state.repo,
        &state.config,
        Role::Member,
        member.id,
        auth::user_agent(&headers),
    )
    .await?;
    Ok(Json(MemberAuthorized { member, token }))
}

/// admin_join
///
/// [Public Route] Registers an administrator. The very first admin may join freely;
/// after that the request must carry the configured `join_key`.
#[utoipa::path(
    post,
    path = "/auth/admin/join",
    tag = "auth",
    request_body = AdminJoinRequest,
    responses(
        (status = 201, description = "Admin registered", body = AdminAuthorized),
        (status = 403, description = "Join key missing or wrong"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn admin_join(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AdminJoinRequest>,
) -> AppResult<(StatusCode, Json<AdminAuthorized>)> {
    let payload = payload.normalize()?;

    if state.repo.count_admins().await? > 0 {
        let authorized = match (&state.config.admin_join_key, &payload.join_key) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        };
        if !authorized {
            tracing::warn!(email = %payload.email, "admin join refused");
            return Err(AppError::forbidden("a valid join_key is required"));
        }
    }
    if state
        .repo
        .get_admin_account_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("email is already registered"));
    }

    let password_hash =
        auth::hash_password(payload.password, state.config.password_memory_kib).await?;
    let admin = state
        .repo
        .create_admin(NewAdmin {
            email: payload.email,
            display_name: payload.display_name,
            password_hash,
        })
        .await?;
    tracing::info!(admin_id = %admin.id, "admin joined");

    let token = auth::start_session(
        &state.repo,
        &state.config,
        Role::Admin,
        admin.id,
        auth::user_agent(&headers),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(AdminAuthorized { admin, token })))
}

/// admin_login
///
/// [Public Route] Verifies admin credentials and opens an admin session.
#[utoipa::path(
    post,
    path = "/auth/admin/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AdminAuthorized),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AdminAuthorized>> {
    let email = payload.email.trim().to_lowercase();
    let Some(account) = state.repo.get_admin_account_by_email(&email).await? else {
        return Err(AppError::Unauthorized);
    };
    if !auth::verify_password(payload.password, account.password_hash).await {
        tracing::info!(admin_id = %account.admin.id, "admin login rejected");
        return Err(AppError::Unauthorized);
    }

    let admin = account.admin;
    let token = auth::start_session(
        &state.repo,
        &state.config,
        Role::Admin,
        admin.id,
        auth::user_agent(&headers),
    )
    .await?;
    Ok(Json(AdminAuthorized { admin, token }))
}

/// refresh
///
/// [Public Route] Rotates the session named by a refresh token of the given role and
/// returns a fresh pair. The presented refresh token stops working.
#[utoipa::path(
    post,
    path = "/auth/{role}/refresh",
    tag = "auth",
    params(("role" = Role, Path, description = "guest, member or admin")),
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Refresh token rejected")
    )
)]
pub async fn refresh(
    state: AppState,
    role: Role,
    payload: RefreshRequest,
) -> AppResult<Json<TokenPair>> {
    let pair =
        auth::refresh_session(&state.repo, &state.config, role, &payload.refresh_token).await?;
    Ok(Json(pair))
}

/// refresh_route
///
/// Binds `refresh` to one role. Each role gets its own static path so it never
/// competes with `/auth/{role}/join` and `/auth/{role}/login` in the router.
pub fn refresh_route(role: Role) -> MethodRouter<AppState> {
    post(
        move |State(state): State<AppState>, Json(payload): Json<RefreshRequest>| async move {
            refresh(state, role, payload).await
        },
    )
}

/// logout
///
/// [Authenticated Route] Revokes the session behind the presented access token.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses((status = 204, description = "Session revoked"))
)]
pub async fn logout(user: AuthUser, State(state): State<AppState>) -> AppResult<StatusCode> {
    state.repo.revoke_session(user.session_id, user.id).await?;
    tracing::info!(role = %user.role, actor_id = %user.id, session_id = %user.session_id, "logged out");
    Ok(StatusCode::NO_CONTENT)
}
