use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{check_len, check_not_blank};
use crate::error::{AppError, AppResult};

// --- Configurations ---

/// Configuration
///
/// Admin-managed key/value setting (`configurations` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Configuration {
    pub id: Uuid,
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateConfigurationRequest {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateConfigurationRequest {
    pub fn normalize(mut self) -> AppResult<Self> {
        self.key = self.key.trim().to_string();
        check_len("key", &self.key, 1, 64)?;
        if !self
            .key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
        {
            return Err(AppError::validation(
                "key may only contain lowercase letters, digits, '_' and '.'",
            ));
        }
        check_len("value", &self.value, 0, 4000)?;
        if let Some(description) = &self.description {
            check_len("description", description, 0, 1000)?;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateConfigurationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateConfigurationRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(value) = &self.value {
            check_len("value", value, 0, 4000)?;
        }
        if let Some(description) = &self.description {
            check_len("description", description, 0, 1000)?;
        }
        Ok(())
    }
}

// --- External Integrations ---

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "integration_kind", rename_all = "lowercase")]
#[ts(export)]
pub enum IntegrationKind {
    Webhook,
    Slack,
    Discord,
}

/// Integration
///
/// An outbound endpoint notified by the platform (`integrations` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Integration {
    pub id: Uuid,
    pub name: String,
    pub kind: IntegrationKind,
    pub endpoint_url: String,
    pub enabled: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateIntegrationRequest {
    pub name: String,
    pub kind: IntegrationKind,
    pub endpoint_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl CreateIntegrationRequest {
    pub fn normalize(mut self) -> AppResult<Self> {
        self.name = self.name.trim().to_string();
        check_not_blank("name", &self.name)?;
        check_len("name", &self.name, 1, 64)?;
        self.endpoint_url = check_endpoint_url(&self.endpoint_url)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateIntegrationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl UpdateIntegrationRequest {
    pub fn normalize(mut self) -> AppResult<Self> {
        if let Some(name) = self.name.take() {
            let name = name.trim().to_string();
            check_not_blank("name", &name)?;
            check_len("name", &name, 1, 64)?;
            self.name = Some(name);
        }
        if let Some(url) = self.endpoint_url.take() {
            self.endpoint_url = Some(check_endpoint_url(&url)?);
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct NewIntegration {
    pub name: String,
    pub kind: IntegrationKind,
    pub endpoint_url: String,
    pub enabled: bool,
}

/// IntegrationPingResult
///
/// Outcome of a test delivery to an integration endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct IntegrationPingResult {
    pub integration_id: Uuid,
    pub status_code: u16,
    pub success: bool,
    pub latency_ms: u64,
}

fn check_endpoint_url(raw: &str) -> AppResult<String> {
    let url = reqwest::Url::parse(raw.trim())
        .map_err(|_| AppError::validation("endpoint_url must be an absolute URL"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AppError::validation("endpoint_url must use http or https"));
    }
    if url.host_str().is_none() {
        return Err(AppError::validation("endpoint_url must include a host"));
    }
    Ok(url.to_string())
}

// --- Dashboard & Uploads ---

/// AdminDashboardStats
///
/// Output schema for `GET /admin/stats`. Counts active rows only.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_members: i64,
    pub total_communities: i64,
    pub total_posts: i64,
    pub total_comments: i64,
    pub total_votes: i64,
    pub pending_reports: i64,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived S3 upload URL (POST /uploads/presigned).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "banner.png")]
    pub filename: String,
    /// The MIME type the upload is constrained to.
    #[schema(example = "image/png")]
    pub file_type: String,
}

impl PresignedUrlRequest {
    pub fn validate(&self) -> AppResult<()> {
        let allowed = self.file_type.starts_with("image/") || self.file_type == "video/mp4";
        if !allowed {
            return Err(AppError::validation(
                "file_type must be an image type or video/mp4",
            ));
        }
        check_not_blank("filename", &self.filename)?;
        check_len("filename", &self.filename, 1, 255)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The S3 object key to reference from communities or posts.
    pub resource_key: String,
}
