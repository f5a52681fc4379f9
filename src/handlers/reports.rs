use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::{PageQuery, comments::find_comment, posts::find_post};
use crate::{
    AppState,
    auth::{AdminUser, MemberUser},
    error::{AppError, AppResult},
    models::{
        CreateReportRequest, NewReport, Page, PageRequest, Report, ReportStatus, ReportTarget,
        ResolveReportRequest,
    },
};

/// ReportQuery
///
/// Filters accepted by `GET /admin/reports`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// `pending`, `resolved` or `dismissed`. All statuses when omitted.
    pub status: Option<ReportStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// create_report
///
/// [Member Route] Flags a post or comment for review. A member can hold a single
/// pending report per target.
#[utoipa::path(
    post,
    path = "/reports",
    tag = "reports",
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report filed", body = Report),
        (status = 404, description = "Target not found"),
        (status = 409, description = "A pending report already exists")
    )
)]
pub async fn create_report(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateReportRequest>,
) -> AppResult<(StatusCode, Json<Report>)> {
    let payload = payload.normalize()?;
    match payload.target_type {
        ReportTarget::Post => {
            find_post(&state, payload.target_id).await?;
        }
        ReportTarget::Comment => {
            find_comment(&state, payload.target_id).await?;
        }
    }

    if state
        .repo
        .find_pending_report(user.id, payload.target_type, payload.target_id)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(
            "you already have a pending report for this content",
        ));
    }

    let report = state
        .repo
        .create_report(NewReport {
            reporter_id: user.id,
            target_type: payload.target_type,
            target_id: payload.target_id,
            reason: payload.reason,
        })
        .await?;
    tracing::info!(report_id = %report.id, reporter_id = %user.id, "report filed");
    Ok((StatusCode::CREATED, Json(report)))
}

/// list_my_reports
///
/// [Member Route] Reports filed by the caller, newest first.
#[utoipa::path(
    get,
    path = "/me/reports",
    tag = "reports",
    params(PageQuery),
    responses((status = 200, description = "Reports filed by the caller", body = Page<Report>))
)]
pub async fn list_my_reports(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Report>>> {
    let page = query.page_request()?;
    Ok(Json(state.repo.list_reports(None, Some(user.id), page).await?))
}

/// admin_list_reports
///
/// [Admin Route] Newest reports first, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/admin/reports",
    tag = "admin",
    params(ReportQuery),
    responses((status = 200, description = "Reports", body = Page<Report>))
)]
pub async fn admin_list_reports(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Page<Report>>> {
    let page = PageRequest::from_query(query.page, query.limit)?;
    Ok(Json(state.repo.list_reports(query.status, None, page).await?))
}

/// admin_get_report
///
/// [Admin Route] A single report in any status.
#[utoipa::path(
    get,
    path = "/admin/reports/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report", body = Report),
        (status = 404, description = "Not found")
    )
)]
pub async fn admin_get_report(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Report>> {
    let report = state
        .repo
        .get_report(id)
        .await?
        .ok_or(AppError::NotFound("report"))?;
    Ok(Json(report))
}

/// resolve_report
///
/// [Admin Route] Closes a pending report as `resolved` or `dismissed`. With
/// `remove_content` the reported post or comment is soft-deleted as well; content
/// that is already gone is not an error.
#[utoipa::path(
    put,
    path = "/admin/reports/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Report id")),
    request_body = ResolveReportRequest,
    responses(
        (status = 200, description = "Report closed", body = Report),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Report already closed")
    )
)]
pub async fn resolve_report(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveReportRequest>,
) -> AppResult<Json<Report>> {
    payload.validate()?;
    let report = state
        .repo
        .get_report(id)
        .await?
        .ok_or(AppError::NotFound("report"))?;
    if report.status != ReportStatus::Pending {
        return Err(AppError::conflict("report has already been closed"));
    }

    let closed = state
        .repo
        .resolve_report(
            id,
            payload.status,
            admin.id,
            payload.resolution_note,
            payload.remove_content,
        )
        .await?
        .ok_or_else(|| AppError::conflict("report has already been closed"))?;

    if payload.remove_content {
        tracing::warn!(
            report_id = %closed.report.id,
            target_id = %closed.report.target_id,
            removed = closed.content_removed,
            admin_id = %admin.id,
            "reported content removed"
        );
    }
    Ok(Json(closed.report))
}
