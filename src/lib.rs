use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod integrations;
pub mod models;
pub mod moderation;
pub mod repository;
pub mod storage;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::{AdminUser, AuthUser};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use integrations::{HttpIntegrationProbe, MockIntegrationProbe, ProbeState};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::guest_join, handlers::auth::member_join, handlers::auth::member_login,
        handlers::auth::admin_join, handlers::auth::admin_login, handlers::auth::refresh,
        handlers::auth::logout,
        handlers::me::get_me, handlers::me::update_profile, handlers::me::delete_me,
        handlers::me::list_sessions, handlers::me::revoke_session,
        handlers::categories::list_categories, handlers::categories::get_category,
        handlers::categories::create_category, handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::communities::list_communities, handlers::communities::get_community,
        handlers::communities::create_community, handlers::communities::update_community,
        handlers::communities::delete_community, handlers::communities::admin_delete_community,
        handlers::memberships::join_community, handlers::memberships::leave_community,
        handlers::memberships::list_community_memberships,
        handlers::memberships::list_my_memberships,
        handlers::recent::record_visit, handlers::recent::list_recent,
        handlers::recent::forget_visit,
        handlers::posts::list_posts, handlers::posts::list_community_posts,
        handlers::posts::get_post, handlers::posts::create_post, handlers::posts::update_post,
        handlers::posts::delete_post, handlers::posts::admin_delete_post,
        handlers::posts::list_snapshots,
        handlers::comments::list_comments, handlers::comments::get_comment,
        handlers::comments::create_comment, handlers::comments::update_comment,
        handlers::comments::delete_comment, handlers::comments::admin_delete_comment,
        handlers::votes::vote_post, handlers::votes::unvote_post,
        handlers::votes::vote_comment, handlers::votes::unvote_comment,
        handlers::reports::create_report, handlers::reports::list_my_reports,
        handlers::reports::admin_list_reports, handlers::reports::admin_get_report,
        handlers::reports::resolve_report,
        handlers::banned_words::list_banned_words, handlers::banned_words::create_banned_word,
        handlers::banned_words::delete_banned_word,
        handlers::configurations::list_configurations,
        handlers::configurations::get_configuration,
        handlers::configurations::create_configuration,
        handlers::configurations::update_configuration,
        handlers::configurations::delete_configuration,
        handlers::integrations::list_integrations, handlers::integrations::get_integration,
        handlers::integrations::create_integration, handlers::integrations::update_integration,
        handlers::integrations::delete_integration, handlers::integrations::ping_integration,
        handlers::uploads::get_presigned_url,
        handlers::admin::get_admin_stats, handlers::admin::list_members,
        handlers::admin::delete_member,
    ),
    components(
        schemas(
            error::ErrorBody,
            models::Role, models::Guest, models::Member, models::Admin, models::Session,
            models::TokenPair, models::MemberJoinRequest, models::LoginRequest,
            models::AdminJoinRequest, models::RefreshRequest, models::UpdateProfileRequest,
            models::GuestAuthorized, models::MemberAuthorized, models::AdminAuthorized,
            models::MeResponse,
            models::Category, models::CreateCategoryRequest, models::UpdateCategoryRequest,
            models::Community, models::CreateCommunityRequest, models::UpdateCommunityRequest,
            models::Membership, models::RecentCommunity,
            models::Post, models::CreatePostRequest, models::UpdatePostRequest,
            models::PostSnapshot, models::PostSort, models::Comment,
            models::CreateCommentRequest, models::UpdateCommentRequest,
            models::VoteRequest, models::VoteSummary,
            models::ReportTarget, models::ReportStatus, models::Report,
            models::CreateReportRequest, models::ResolveReportRequest,
            models::BannedWord, models::CreateBannedWordRequest,
            models::Configuration, models::CreateConfigurationRequest,
            models::UpdateConfigurationRequest,
            models::IntegrationKind, models::Integration, models::CreateIntegrationRequest,
            models::UpdateIntegrationRequest, models::IntegrationPingResult,
            models::AdminDashboardStats, models::PresignedUrlRequest,
            models::PresignedUrlResponse, models::Pagination,
        )
    ),
    tags(
        (name = "auth", description = "Join, login, refresh and logout for every actor role"),
        (name = "me", description = "The caller's profile, sessions and recent communities"),
        (name = "categories", description = "Community categories"),
        (name = "communities", description = "Communities"),
        (name = "memberships", description = "Community memberships"),
        (name = "posts", description = "Posts and their edit history"),
        (name = "comments", description = "Threaded comments"),
        (name = "votes", description = "Post and comment votes"),
        (name = "reports", description = "Member reports"),
        (name = "uploads", description = "Presigned media uploads"),
        (name = "admin", description = "Moderation and platform settings"),
        (name = "health", description = "Liveness"),
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration, cloned into every
/// request. Each service sits behind an `Arc<dyn Trait>` so tests can swap in the
/// in-memory repository and the mock storage/probe.
#[derive(Clone)]
pub struct AppState {
    /// Persistence (Postgres or in-memory).
    pub repo: RepositoryState,
    /// S3/MinIO presigning.
    pub storage: StorageState,
    /// Outbound integration pings.
    pub probe: ProbeState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for ProbeState {
    fn from_ref(app_state: &AppState) -> ProbeState {
        app_state.probe.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards `authenticated_routes`. Extracting `AuthUser` validates the bearer token
/// and its session; a failure rejects the request with 401 before the handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Guards `admin_routes`: 401 without a valid token, 403 for non-admin roles.
async fn admin_middleware(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, applies the access-level middleware and the
/// observability stack, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // `route_layer` only wraps matched routes, so unknown paths still 404.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                admin_middleware,
            )),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the `TraceLayer` span with method, URI and the `x-request-id` so every log
/// line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
