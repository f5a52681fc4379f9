use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::PageQuery;
use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{
        CreateIntegrationRequest, Integration, IntegrationPingResult, NewIntegration, Page,
        UpdateIntegrationRequest,
    },
};

async fn find_integration(state: &AppState, id: Uuid) -> AppResult<Integration> {
    state
        .repo
        .get_integration(id)
        .await?
        .ok_or(AppError::NotFound("integration"))
}

/// list_integrations
///
/// [Admin Route] Registered integrations by name.
#[utoipa::path(
    get,
    path = "/admin/integrations",
    tag = "admin",
    params(PageQuery),
    responses((status = 200, description = "Integrations", body = Page<Integration>))
)]
pub async fn list_integrations(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Integration>>> {
    let page = query.page_request()?;
    Ok(Json(state.repo.list_integrations(page).await?))
}

/// get_integration
///
/// [Admin Route] A single integration.
#[utoipa::path(
    get,
    path = "/admin/integrations/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Integration id")),
    responses(
        (status = 200, description = "Integration", body = Integration),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_integration(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Integration>> {
    Ok(Json(find_integration(&state, id).await?))
}

/// create_integration
///
/// [Admin Route] Registers an outbound endpoint. Names are unique and the endpoint
/// must be an absolute http(s) URL.
#[utoipa::path(
    post,
    path = "/admin/integrations",
    tag = "admin",
    request_body = CreateIntegrationRequest,
    responses(
        (status = 201, description = "Created", body = Integration),
        (status = 400, description = "Invalid name or endpoint"),
        (status = 409, description = "Name taken")
    )
)]
pub async fn create_integration(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateIntegrationRequest>,
) -> AppResult<(StatusCode, Json<Integration>)> {
    let payload = payload.normalize()?;
    if state
        .repo
        .get_integration_by_name(&payload.name)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("integration name is already taken"));
    }
    let integration = state
        .repo
        .create_integration(NewIntegration {
            name: payload.name,
            kind: payload.kind,
            endpoint_url: payload.endpoint_url,
            enabled: payload.enabled,
        })
        .await?;
    tracing::info!(
        admin_id = %admin.id,
        integration_id = %integration.id,
        kind = ?integration.kind,
        "integration registered"
    );
    Ok((StatusCode::CREATED, Json(integration)))
}

/// update_integration
///
/// [Admin Route] Partial update. A rename must not collide with another integration.
#[utoipa::path(
    put,
    path = "/admin/integrations/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Integration id")),
    request_body = UpdateIntegrationRequest,
    responses(
        (status = 200, description = "Updated", body = Integration),
        (status = 404, description = "Not found"),
        (status = 409, description = "Name taken")
    )
)]
pub async fn update_integration(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIntegrationRequest>,
) -> AppResult<Json<Integration>> {
    let payload = payload.normalize()?;
    find_integration(&state, id).await?;
    if let Some(name) = &payload.name {
        if let Some(existing) = state.repo.get_integration_by_name(name).await? {
            if existing.id != id {
                return Err(AppError::conflict("integration name is already taken"));
            }
        }
    }
    let integration = state
        .repo
        .update_integration(id, payload)
        .await?
        .ok_or(AppError::NotFound("integration"))?;
    Ok(Json(integration))
}

/// delete_integration
///
/// [Admin Route] Soft-deletes an integration.
#[utoipa::path(
    delete,
    path = "/admin/integrations/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Integration id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_integration(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.repo.delete_integration(id).await? {
        return Err(AppError::NotFound("integration"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// ping_integration
///
/// [Admin Route] Sends a test event to the endpoint and reports what came back.
/// Any HTTP answer is a result (non-2xx sets `success: false`); an unreachable
/// endpoint is a 502.
#[utoipa::path(
    post,
    path = "/admin/integrations/{id}/ping",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Integration id")),
    responses(
        (status = 200, description = "Endpoint answered", body = IntegrationPingResult),
        (status = 404, description = "Not found"),
        (status = 409, description = "Integration disabled"),
        (status = 502, description = "Endpoint unreachable")
    )
)]
pub async fn ping_integration(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<IntegrationPingResult>> {
    let integration = find_integration(&state, id).await?;
    if !integration.enabled {
        return Err(AppError::conflict("integration is disabled"));
    }

    let outcome = state.probe.ping(&integration).await.map_err(|e| {
        tracing::warn!(integration_id = %id, error = %e, "integration ping failed");
        AppError::BadGateway(e.to_string())
    })?;

    Ok(Json(IntegrationPingResult {
        integration_id: id,
        status_code: outcome.status_code,
        success: outcome.success(),
        latency_ms: outcome.latency_ms,
    }))
}
