use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{check_handle, check_len, check_not_blank};
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Role
///
/// The kind of actor a token was issued to. Stored as the `actor_role` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "actor_role", rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Guest,
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guest
///
/// An anonymous visitor that asked for a token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Guest {
    pub id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Member
///
/// Public view of a registered community member (`members` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Member {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// MemberAccount
///
/// A member row together with its password hash. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct MemberAccount {
    #[sqlx(flatten)]
    pub member: Member,
    pub password_hash: String,
}

/// Admin
///
/// Public view of an administrator (`admins` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AdminAccount {
    #[sqlx(flatten)]
    pub admin: Admin,
    pub password_hash: String,
}

/// Session
///
/// Server-side record backing a refresh token. `refresh_jti` identifies the only
/// refresh token currently accepted for this session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Session {
    pub id: Uuid,
    pub actor_role: Role,
    pub actor_id: Uuid,
    pub user_agent: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub last_refreshed_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub refresh_jti: Uuid,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// NewSession
///
/// Insert payload for a session, built by the auth layer.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: Uuid,
    pub actor_role: Role,
    pub actor_id: Uuid,
    pub refresh_jti: Uuid,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// TokenPair
///
/// Access and refresh tokens issued together for one session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[ts(type = "string")]
    pub access_expires_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub refresh_expires_at: DateTime<Utc>,
}

// --- Request Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MemberJoinRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl MemberJoinRequest {
    /// Trims and lower-cases identifiers, then checks every field.
    pub fn normalize(mut self) -> AppResult<Self> {
        self.email = normalize_email(&self.email)?;
        self.username = self.username.trim().to_lowercase();
        check_handle("username", &self.username, 3, 32)?;
        check_password(&self.password)?;
        if let Some(name) = &self.display_name {
            check_len("display_name", name, 1, 64)?;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminJoinRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    /// Required once at least one admin exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_key: Option<String>,
}

impl AdminJoinRequest {
    pub fn normalize(mut self) -> AppResult<Self> {
        self.email = normalize_email(&self.email)?;
        check_password(&self.password)?;
        check_not_blank("display_name", &self.display_name)?;
        check_len("display_name", &self.display_name, 1, 64)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
}

impl UpdateProfileRequest {
    /// A blank name clears it.
    pub fn normalize(mut self) -> AppResult<Self> {
        self.display_name = self
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        if let Some(name) = &self.display_name {
            check_len("display_name", name, 1, 64)?;
        }
        Ok(self)
    }
}

/// Insert payload for a member; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
}

// --- Responses ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct GuestAuthorized {
    pub guest: Guest,
    pub token: TokenPair,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MemberAuthorized {
    pub member: Member,
    pub token: TokenPair,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminAuthorized {
    pub admin: Admin,
    pub token: TokenPair,
}

/// MeResponse
///
/// Output schema for `GET /me`. Fields not applicable to the caller's role are omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MeResponse {
    pub id: Uuid,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    check_len("email", &email, 3, 254)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::validation("email must be a valid address")),
    }
}

fn check_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
