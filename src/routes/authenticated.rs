use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Routes that need a valid access token. The `auth_middleware` layer in `lib.rs`
/// rejects anonymous requests before they get here; handlers that are member-only
/// additionally take the `MemberUser` extractor, which turns guests and admins
/// away with 403. Ownership checks (author, owner) happen inside the handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /auth/logout
        // Revokes the session behind the presented access token. Any role.
        .route("/auth/logout", post(handlers::auth::logout))
        // --- Caller ---
        // GET/DELETE /me
        // Profile of whoever holds the token; DELETE closes a member account.
        .route(
            "/me",
            get(handlers::me::get_me).delete(handlers::me::delete_me),
        )
        // PUT /me/profile
        .route("/me/profile", put(handlers::me::update_profile))
        // GET /me/sessions, DELETE /me/sessions/{id}
        // Lists and revokes the caller's active sessions (other devices).
        .route("/me/sessions", get(handlers::me::list_sessions))
        .route("/me/sessions/{id}", delete(handlers::me::revoke_session))
        // GET /me/memberships
        .route(
            "/me/memberships",
            get(handlers::memberships::list_my_memberships),
        )
        // GET /me/reports
        .route("/me/reports", get(handlers::reports::list_my_reports))
        // GET /me/recent-communities?limit=
        // PUT/DELETE /me/recent-communities/{community_id}
        .route("/me/recent-communities", get(handlers::recent::list_recent))
        .route(
            "/me/recent-communities/{community_id}",
            put(handlers::recent::record_visit).delete(handlers::recent::forget_visit),
        )
        // --- Communities ---
        // POST /communities
        // The creator becomes the owner and first member in one transaction.
        .route("/communities", post(handlers::communities::create_community))
        // PUT/DELETE /communities/{id}
        // Owner-only.
        .route(
            "/communities/{id}",
            put(handlers::communities::update_community)
                .delete(handlers::communities::delete_community),
        )
        // POST/DELETE /communities/{id}/memberships
        // Join or leave. Owners cannot leave.
        .route(
            "/communities/{id}/memberships",
            post(handlers::memberships::join_community)
                .delete(handlers::memberships::leave_community),
        )
        // --- Posts & Comments ---
        // POST /communities/{id}/posts
        // Members of the community only; screened against banned words.
        .route(
            "/communities/{id}/posts",
            post(handlers::posts::create_post),
        )
        // PUT/DELETE /posts/{id}
        // Author-only. Each edit records a snapshot.
        .route(
            "/posts/{id}",
            put(handlers::posts::update_post).delete(handlers::posts::delete_post),
        )
        // POST /posts/{id}/comments
        .route(
            "/posts/{id}/comments",
            post(handlers::comments::create_comment),
        )
        // PUT/DELETE /comments/{id}
        .route(
            "/comments/{id}",
            put(handlers::comments::update_comment).delete(handlers::comments::delete_comment),
        )
        // --- Votes ---
        // PUT/DELETE /posts/{id}/vote, /comments/{id}/vote
        // One vote per member and target; PUT replaces, DELETE retracts.
        .route(
            "/posts/{id}/vote",
            put(handlers::votes::vote_post).delete(handlers::votes::unvote_post),
        )
        .route(
            "/comments/{id}/vote",
            put(handlers::votes::vote_comment).delete(handlers::votes::unvote_comment),
        )
        // --- Moderation ---
        // POST /reports
        // One pending report per member and target.
        .route("/reports", post(handlers::reports::create_report))
        // --- Media ---
        // POST /uploads/presigned
        // Short-lived (10 minute) presigned PUT URL for direct-to-bucket uploads.
        .route("/uploads/presigned", post(handlers::uploads::get_presigned_url))
}
