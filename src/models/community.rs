use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{check_handle, check_len, check_not_blank};
use crate::error::AppResult;

/// Category
///
/// Admin-curated grouping for communities (`categories` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub display_order: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

impl CreateCategoryRequest {
    pub fn normalize(mut self) -> AppResult<Self> {
        self.name = self.name.trim().to_string();
        check_not_blank("name", &self.name)?;
        check_len("name", &self.name, 1, 64)?;
        if let Some(description) = &self.description {
            check_len("description", description, 0, 1000)?;
        }
        Ok(self)
    }
}

/// Partial update; only provided fields change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

impl UpdateCategoryRequest {
    pub fn normalize(mut self) -> AppResult<Self> {
        if let Some(name) = self.name.take() {
            let name = name.trim().to_string();
            check_not_blank("name", &name)?;
            check_len("name", &name, 1, 64)?;
            self.name = Some(name);
        }
        if let Some(description) = &self.description {
            check_len("description", description, 0, 1000)?;
        }
        Ok(self)
    }
}

/// Community
///
/// A member-owned discussion space. `member_count` counts active memberships.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub owner_id: Uuid,
    // S3 keys produced by the presigned upload flow.
    pub logo_key: Option<String>,
    pub banner_key: Option<String>,
    pub member_count: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommunityRequest {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
}

impl CreateCommunityRequest {
    pub fn normalize(mut self) -> AppResult<Self> {
        self.name = self.name.trim().to_lowercase();
        check_handle("name", &self.name, 3, 32)?;
        self.title = self.title.trim().to_string();
        check_not_blank("title", &self.title)?;
        check_len("title", &self.title, 1, 100)?;
        if let Some(description) = &self.description {
            check_len("description", description, 0, 2000)?;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCommunityRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_key: Option<String>,
}

impl UpdateCommunityRequest {
    pub fn normalize(mut self) -> AppResult<Self> {
        if let Some(title) = self.title.take() {
            let title = title.trim().to_string();
            check_not_blank("title", &title)?;
            check_len("title", &title, 1, 100)?;
            self.title = Some(title);
        }
        if let Some(description) = &self.description {
            check_len("description", description, 0, 2000)?;
        }
        Ok(self)
    }
}

/// Insert payload for a community; the owner comes from the session.
#[derive(Debug, Clone)]
pub struct NewCommunity {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub owner_id: Uuid,
}

/// Membership
///
/// An active (community, member) pair.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Membership {
    pub id: Uuid,
    pub community_id: Uuid,
    pub member_id: Uuid,
    #[ts(type = "string")]
    pub joined_at: DateTime<Utc>,
}

/// RecentCommunity
///
/// A community the member visited, most recent visit wins.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct RecentCommunity {
    pub community_id: Uuid,
    pub name: String,
    pub title: String,
    #[ts(type = "string")]
    pub visited_at: DateTime<Utc>,
}

/// CommunityFilter
///
/// Listing filters accepted by `GET /communities`.
#[derive(Debug, Clone, Default)]
pub struct CommunityFilter {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
}
