use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{check_len, check_not_blank};
use crate::error::{AppError, AppResult};

/// Fallback for the `post.max_body_length` configuration entry.
pub const DEFAULT_MAX_POST_BODY: usize = 40_000;
pub const MAX_COMMENT_BODY: usize = 10_000;

/// Post
///
/// A post inside a community. `score` is the sum of its votes and `comment_count`
/// counts its active comments.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    pub community_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub score: i64,
    pub comment_count: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl CreatePostRequest {
    pub fn normalize(mut self, max_body: usize) -> AppResult<Self> {
        self.title = self.title.trim().to_string();
        check_not_blank("title", &self.title)?;
        check_len("title", &self.title, 1, 300)?;
        check_len("body", &self.body, 0, max_body)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl UpdatePostRequest {
    pub fn normalize(mut self, max_body: usize) -> AppResult<Self> {
        if self.title.is_none() && self.body.is_none() {
            return Err(AppError::validation("nothing to update"));
        }
        if let Some(title) = self.title.take() {
            let title = title.trim().to_string();
            check_not_blank("title", &title)?;
            check_len("title", &title, 1, 300)?;
            self.title = Some(title);
        }
        if let Some(body) = &self.body {
            check_len("body", body, 0, max_body)?;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub community_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
}

/// PostSnapshot
///
/// One recorded version of a post. A snapshot is written on creation and on every edit.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PostSnapshot {
    pub id: Uuid,
    pub post_id: Uuid,
    pub title: String,
    pub body: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// PostSort
///
/// Ordering for post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PostSort {
    #[default]
    New,
    Top,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub community_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub search: Option<String>,
    pub sort: PostSort,
}

/// Comment
///
/// A comment on a post, optionally replying to another comment of the same post.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub score: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

impl CreateCommentRequest {
    pub fn normalize(self) -> AppResult<Self> {
        check_not_blank("body", &self.body)?;
        check_len("body", &self.body, 1, MAX_COMMENT_BODY)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCommentRequest {
    pub body: String,
}

impl UpdateCommentRequest {
    pub fn normalize(self) -> AppResult<Self> {
        check_not_blank("body", &self.body)?;
        check_len("body", &self.body, 1, MAX_COMMENT_BODY)?;
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub body: String,
}

/// VoteTarget
///
/// What a vote is cast on. Post and comment votes live in separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteTarget {
    Post,
    Comment,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct VoteRequest {
    /// `1` for an upvote, `-1` for a downvote.
    pub value: i16,
}

impl VoteRequest {
    pub fn validate(&self) -> AppResult<()> {
        match self.value {
            1 | -1 => Ok(()),
            _ => Err(AppError::validation("value must be 1 or -1")),
        }
    }
}

/// VoteSummary
///
/// The target's score after a vote change, plus the caller's current vote.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct VoteSummary {
    pub target_id: Uuid,
    pub score: i64,
    pub my_vote: Option<i16>,
}
