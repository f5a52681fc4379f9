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
    models::{Category, CreateCategoryRequest, Page, UpdateCategoryRequest},
};

/// list_categories
///
/// [Public Route] Categories ordered by `display_order`, then name.
#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    params(PageQuery),
    responses((status = 200, description = "Categories", body = Page<Category>))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Category>>> {
    let page = query.page_request()?;
    Ok(Json(state.repo.list_categories(page).await?))
}

/// get_category
///
/// [Public Route] A single active category.
#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "categories",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Category>> {
    let category = state
        .repo
        .get_category(id)
        .await?
        .ok_or(AppError::NotFound("category"))?;
    Ok(Json(category))
}

/// create_category
///
/// [Admin Route] Names are unique among active categories.
#[utoipa::path(
    post,
    path = "/admin/categories",
    tag = "admin",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 409, description = "Name taken")
    )
)]
pub async fn create_category(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let payload = payload.normalize()?;
    if state.repo.get_category_by_name(&payload.name).await?.is_some() {
        return Err(AppError::conflict("category name is already taken"));
    }
    let category = state.repo.create_category(payload).await?;
    tracing::info!(admin_id = %admin.id, category_id = %category.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// update_category
///
/// [Admin Route] Partial update; renaming onto another active category's name is a 409.
#[utoipa::path(
    put,
    path = "/admin/categories/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not found"),
        (status = 409, description = "Name taken")
    )
)]
pub async fn update_category(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> AppResult<Json<Category>> {
    let payload = payload.normalize()?;
    if let Some(name) = &payload.name {
        if let Some(existing) = state.repo.get_category_by_name(name).await? {
            if existing.id != id {
                return Err(AppError::conflict("category name is already taken"));
            }
        }
    }
    let category = state
        .repo
        .update_category(id, payload)
        .await?
        .ok_or(AppError::NotFound("category"))?;
    Ok(Json(category))
}

/// delete_category
///
/// [Admin Route] Refused with 409 while active communities still use the category.
#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Category in use")
    )
)]
pub async fn delete_category(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.repo.get_category(id).await?.is_none() {
        return Err(AppError::NotFound("category"));
    }
    let in_use = state.repo.count_communities_in_category(id).await?;
    if in_use > 0 {
        return Err(AppError::conflict(format!(
            "category is used by {in_use} communities"
        )));
    }
    if !state.repo.delete_category(id).await? {
        return Err(AppError::NotFound("category"));
    }
    tracing::info!(admin_id = %admin.id, category_id = %id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}
