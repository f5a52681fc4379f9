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
    models::{Configuration, CreateConfigurationRequest, Page, UpdateConfigurationRequest},
};

/// list_configurations
///
/// [Admin Route] Entries ordered by key.
#[utoipa::path(
    get,
    path = "/admin/configurations",
    tag = "admin",
    params(PageQuery),
    responses((status = 200, description = "Configurations", body = Page<Configuration>))
)]
pub async fn list_configurations(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Configuration>>> {
    let page = query.page_request()?;
    Ok(Json(state.repo.list_configurations(page).await?))
}

/// get_configuration
///
/// [Admin Route] A single configuration entry.
#[utoipa::path(
    get,
    path = "/admin/configurations/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Configuration id")),
    responses(
        (status = 200, description = "Configuration", body = Configuration),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_configuration(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Configuration>> {
    let entry = state
        .repo
        .get_configuration(id)
        .await?
        .ok_or(AppError::NotFound("configuration"))?;
    Ok(Json(entry))
}

/// create_configuration
///
/// [Admin Route] Keys use lowercase letters, digits, '_' and '.' and must be unique.
#[utoipa::path(
    post,
    path = "/admin/configurations",
    tag = "admin",
    request_body = CreateConfigurationRequest,
    responses(
        (status = 201, description = "Created", body = Configuration),
        (status = 400, description = "Invalid key or value"),
        (status = 409, description = "Key already exists")
    )
)]
pub async fn create_configuration(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateConfigurationRequest>,
) -> AppResult<(StatusCode, Json<Configuration>)> {
    let payload = payload.normalize()?;
    if state
        .repo
        .get_configuration_by_key(&payload.key)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("configuration key already exists"));
    }
    let entry = state.repo.create_configuration(payload).await?;
    tracing::info!(admin_id = %admin.id, key = %entry.key, "configuration created");
    Ok((StatusCode::CREATED, Json(entry)))
}

/// update_configuration
///
/// [Admin Route] Keys are immutable; only `value` and `description` change.
#[utoipa::path(
    put,
    path = "/admin/configurations/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Configuration id")),
    request_body = UpdateConfigurationRequest,
    responses(
        (status = 200, description = "Updated", body = Configuration),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_configuration(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateConfigurationRequest>,
) -> AppResult<Json<Configuration>> {
    payload.validate()?;
    let entry = state
        .repo
        .update_configuration(id, payload)
        .await?
        .ok_or(AppError::NotFound("configuration"))?;
    tracing::info!(admin_id = %admin.id, key = %entry.key, "configuration updated");
    Ok(Json(entry))
}

/// delete_configuration
///
/// [Admin Route] Soft-deletes an entry, freeing its key.
#[utoipa::path(
    delete,
    path = "/admin/configurations/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Configuration id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_configuration(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.repo.delete_configuration(id).await? {
        return Err(AppError::NotFound("configuration"));
    }
    Ok(StatusCode::NO_CONTENT)
}
