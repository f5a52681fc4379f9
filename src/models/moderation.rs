use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{check_len, check_not_blank};
use crate::error::{AppError, AppResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "report_target", rename_all = "lowercase")]
#[ts(export)]
pub enum ReportTarget {
    Post,
    Comment,
}

/// ReportStatus
///
/// Reports start `pending`; an admin moves them to `resolved` or `dismissed` exactly once.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "report_status", rename_all = "lowercase")]
#[ts(export)]
pub enum ReportStatus {
    Pending,
    Resolved,
    Dismissed,
}

/// Report
///
/// A member's moderation report against a post or comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub target_type: ReportTarget,
    pub target_id: Uuid,
    pub reason: String,
    pub status: ReportStatus,
    pub resolution_note: Option<String>,
    pub resolved_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateReportRequest {
    pub target_type: ReportTarget,
    pub target_id: Uuid,
    pub reason: String,
}

impl CreateReportRequest {
    pub fn normalize(mut self) -> AppResult<Self> {
        self.reason = self.reason.trim().to_string();
        check_not_blank("reason", &self.reason)?;
        check_len("reason", &self.reason, 1, 500)?;
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub reporter_id: Uuid,
    pub target_type: ReportTarget,
    pub target_id: Uuid,
    pub reason: String,
}

/// ResolveReportRequest
///
/// Admin decision on a pending report. `remove_content` only applies to `resolved`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ResolveReportRequest {
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_note: Option<String>,
    #[serde(default)]
    pub remove_content: bool,
}

impl ResolveReportRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.status == ReportStatus::Pending {
            return Err(AppError::validation("status must be resolved or dismissed"));
        }
        if self.remove_content && self.status != ReportStatus::Resolved {
            return Err(AppError::validation(
                "remove_content requires status resolved",
            ));
        }
        if let Some(note) = &self.resolution_note {
            check_len("resolution_note", note, 0, 1000)?;
        }
        Ok(())
    }
}

/// BannedWord
///
/// A word or phrase rejected in user-authored text.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct BannedWord {
    pub id: Uuid,
    pub word: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateBannedWordRequest {
    pub word: String,
}

impl CreateBannedWordRequest {
    /// Stored form is trimmed and lower-cased.
    pub fn normalize(mut self) -> AppResult<Self> {
        self.word = self.word.trim().to_lowercase();
        check_not_blank("word", &self.word)?;
        check_len("word", &self.word, 1, 64)?;
        Ok(self)
    }
}
