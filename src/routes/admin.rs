use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin Router Module
///
/// Moderation and platform settings, nested under `/admin`. `create_router` wraps
/// this router in `admin_middleware`, which requires an admin access token; the
/// handlers take `AdminUser` as well so the acting admin's id is at hand for logs
/// and report resolution.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Dashboard counters over active rows.
        .route("/stats", get(handlers::admin::get_admin_stats))
        // GET /admin/members?search=, DELETE /admin/members/{id}
        // Deleting a member also revokes every session it holds.
        .route("/members", get(handlers::admin::list_members))
        .route("/members/{id}", delete(handlers::admin::delete_member))
        // --- Categories ---
        .route("/categories", post(handlers::categories::create_category))
        .route(
            "/categories/{id}",
            put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        // --- Force Deletes ---
        // Bypass ownership; the target is soft-deleted like any other delete.
        .route(
            "/communities/{id}",
            delete(handlers::communities::admin_delete_community),
        )
        .route("/posts/{id}", delete(handlers::posts::admin_delete_post))
        .route(
            "/comments/{id}",
            delete(handlers::comments::admin_delete_comment),
        )
        // --- Reports ---
        // GET /admin/reports?status=, GET/PUT /admin/reports/{id}
        // PUT closes a pending report and can remove the reported content.
        .route("/reports", get(handlers::reports::admin_list_reports))
        .route(
            "/reports/{id}",
            get(handlers::reports::admin_get_report).put(handlers::reports::resolve_report),
        )
        // --- Banned Words ---
        .route(
            "/banned-words",
            get(handlers::banned_words::list_banned_words)
                .post(handlers::banned_words::create_banned_word),
        )
        .route(
            "/banned-words/{id}",
            delete(handlers::banned_words::delete_banned_word),
        )
        // --- Configurations ---
        // `post.max_body_length` here overrides the post body limit.
        .route(
            "/configurations",
            get(handlers::configurations::list_configurations)
                .post(handlers::configurations::create_configuration),
        )
        .route(
            "/configurations/{id}",
            get(handlers::configurations::get_configuration)
                .put(handlers::configurations::update_configuration)
                .delete(handlers::configurations::delete_configuration),
        )
        // --- External Integrations ---
        .route(
            "/integrations",
            get(handlers::integrations::list_integrations)
                .post(handlers::integrations::create_integration),
        )
        .route(
            "/integrations/{id}",
            get(handlers::integrations::get_integration)
                .put(handlers::integrations::update_integration)
                .delete(handlers::integrations::delete_integration),
        )
        // POST /admin/integrations/{id}/ping
        // Sends a test event and reports status code and latency.
        .route(
            "/integrations/{id}/ping",
            post(handlers::integrations::ping_integration),
        )
}
