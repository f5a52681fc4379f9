use crate::{AppState, handlers, models::Role};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token: the join/login/refresh gateway and
/// read-only access to communities, posts and comments. Soft-deleted rows never
/// leave the repository, so nothing here needs its own visibility check.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness check for load balancers.
        .route("/health", get(handlers::health::health))
        // --- Auth Gateway ---
        // POST /auth/guest/join
        // Creates an anonymous guest actor and its first session.
        .route("/auth/guest/join", post(handlers::auth::guest_join))
        // POST /auth/member/join, /auth/member/login
        // Member registration (Argon2 hashed) and password login.
        .route("/auth/member/join", post(handlers::auth::member_join))
        .route("/auth/member/login", post(handlers::auth::member_login))
        // POST /auth/admin/join, /auth/admin/login
        // Admin registration is open only for bootstrap or with the shared join key.
        .route("/auth/admin/join", post(handlers::auth::admin_join))
        .route("/auth/admin/login", post(handlers::auth::admin_login))
        // POST /auth/{role}/refresh
        // Rotates the session behind a refresh token; the old token stops working.
        .route("/auth/guest/refresh", handlers::auth::refresh_route(Role::Guest))
        .route("/auth/member/refresh", handlers::auth::refresh_route(Role::Member))
        .route("/auth/admin/refresh", handlers::auth::refresh_route(Role::Admin))
        // --- Catalogue ---
        // GET /categories, /categories/{id}
        .route("/categories", get(handlers::categories::list_categories))
        .route("/categories/{id}", get(handlers::categories::get_category))
        // GET /communities?search=&category_id=
        // Paginated listing with the live member count.
        .route("/communities", get(handlers::communities::list_communities))
        .route("/communities/{id}", get(handlers::communities::get_community))
        // GET /communities/{id}/memberships
        .route(
            "/communities/{id}/memberships",
            get(handlers::memberships::list_community_memberships),
        )
        // GET /communities/{id}/posts?sort=new|top
        .route(
            "/communities/{id}/posts",
            get(handlers::posts::list_community_posts),
        )
        // --- Content ---
        // GET /posts?community_id=&author_id=&search=&sort=
        .route("/posts", get(handlers::posts::list_posts))
        .route("/posts/{id}", get(handlers::posts::get_post))
        // GET /posts/{id}/snapshots
        // Edit history of a post, oldest version first.
        .route("/posts/{id}/snapshots", get(handlers::posts::list_snapshots))
        // GET /posts/{id}/comments
        .route("/posts/{id}/comments", get(handlers::comments::list_comments))
        .route("/comments/{id}", get(handlers::comments::get_comment))
}
