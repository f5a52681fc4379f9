use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::{banned_words, communities::find_community, max_post_body};
use crate::{
    AppState,
    auth::{AdminUser, MemberUser},
    error::{AppError, AppResult},
    models::{
        CreatePostRequest, NewPost, Page, PageRequest, Post, PostFilter, PostSnapshot, PostSort,
        UpdatePostRequest,
    },
    moderation,
};

/// PostQuery
///
/// Query parameters for `GET /posts`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostQuery {
    pub community_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    /// Case-insensitive match on title or body.
    pub search: Option<String>,
    /// `new` (default) or `top`.
    pub sort: Option<PostSort>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Query parameters for `GET /communities/{id}/posts`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommunityPostQuery {
    pub sort: Option<PostSort>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub(crate) async fn find_post(state: &AppState, id: Uuid) -> AppResult<Post> {
    state
        .repo
        .get_post(id)
        .await?
        .ok_or(AppError::NotFound("post"))
}

/// list_posts
///
/// [Public Route] Posts across all communities.
#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    params(PostQuery),
    responses((status = 200, description = "Posts", body = Page<Post>))
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> AppResult<Json<Page<Post>>> {
    let page = PageRequest::from_query(query.page, query.limit)?;
    let filter = PostFilter {
        community_id: query.community_id,
        author_id: query.author_id,
        search: query.search.filter(|s| !s.trim().is_empty()),
        sort: query.sort.unwrap_or_default(),
    };
    Ok(Json(state.repo.list_posts(filter, page).await?))
}

/// list_community_posts
///
/// [Public Route] Active posts of one community, newest first or by `sort=top`.
#[utoipa::path(
    get,
    path = "/communities/{id}/posts",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Community id"), CommunityPostQuery),
    responses(
        (status = 200, description = "Posts of the community", body = Page<Post>),
        (status = 404, description = "Community not found")
    )
)]
pub async fn list_community_posts(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Query(query): Query<CommunityPostQuery>,
) -> AppResult<Json<Page<Post>>> {
    let page = PageRequest::from_query(query.page, query.limit)?;
    find_community(&state, community_id).await?;
    let filter = PostFilter {
        community_id: Some(community_id),
        sort: query.sort.unwrap_or_default(),
        ..PostFilter::default()
    };
    Ok(Json(state.repo.list_posts(filter, page).await?))
}

/// get_post
///
/// [Public Route] A single active post with its score and comment count.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = Post),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_post(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Post>> {
    Ok(Json(find_post(&state, id).await?))
}

/// create_post
///
/// [Member Route] Only members of the community may post. The body limit comes from
/// the `post.max_body_length` configuration entry. The first snapshot is recorded
/// together with the post.
#[utoipa::path(
    post,
    path = "/communities/{id}/posts",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Community id")),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Invalid input or banned word"),
        (status = 403, description = "Not a member of the community"),
        (status = 404, description = "Community not found")
    )
)]
pub async fn create_post(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Post>)> {
    find_community(&state, community_id).await?;
    if state
        .repo
        .get_membership(community_id, user.id)
        .await?
        .is_none()
    {
        return Err(AppError::forbidden("join the community before posting"));
    }

    let payload = payload.normalize(max_post_body(&state).await?)?;
    let banned = banned_words(&state).await?;
    moderation::screen(
        &[("title", payload.title.as_str()), ("body", payload.body.as_str())],
        &banned,
    )?;

    let post = state
        .repo
        .create_post(NewPost {
            community_id,
            author_id: user.id,
            title: payload.title,
            body: payload.body,
        })
        .await?;
    tracing::info!(post_id = %post.id, %community_id, author_id = %user.id, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Member Route] Author-only partial edit. Every successful edit appends a snapshot.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_post(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> AppResult<Json<Post>> {
    let post = find_post(&state, id).await?;
    if post.author_id != user.id {
        return Err(AppError::forbidden("only the author may edit this post"));
    }

    let payload = payload.normalize(max_post_body(&state).await?)?;
    let banned = banned_words(&state).await?;
    moderation::screen(
        &[
            ("title", payload.title.as_deref().unwrap_or("")),
            ("body", payload.body.as_deref().unwrap_or("")),
        ],
        &banned,
    )?;

    let updated = state
        .repo
        .update_post(id, payload.title, payload.body)
        .await?
        .ok_or(AppError::NotFound("post"))?;
    Ok(Json(updated))
}

/// delete_post
///
/// [Member Route] Author-only soft delete.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_post(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let post = find_post(&state, id).await?;
    if post.author_id != user.id {
        return Err(AppError::forbidden("only the author may delete this post"));
    }
    if !state.repo.delete_post(id).await? {
        return Err(AppError::NotFound("post"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// admin_delete_post
///
/// [Admin Route] Removes any post regardless of author.
#[utoipa::path(
    delete,
    path = "/admin/posts/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn admin_delete_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.repo.delete_post(id).await? {
        return Err(AppError::NotFound("post"));
    }
    tracing::warn!(post_id = %id, admin_id = %admin.id, "post removed by admin");
    Ok(StatusCode::NO_CONTENT)
}

/// list_snapshots
///
/// [Public Route] Every recorded version of a post, oldest first.
#[utoipa::path(
    get,
    path = "/posts/{id}/snapshots",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Snapshots", body = [PostSnapshot]),
        (status = 404, description = "Post not found")
    )
)]
pub async fn list_snapshots(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<PostSnapshot>>> {
    find_post(&state, id).await?;
    Ok(Json(state.repo.list_post_snapshots(id).await?))
}
