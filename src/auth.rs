use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::{NewSession, Role, Session, TokenPair},
    repository::RepositoryState,
};

/// TokenKind
///
/// Access tokens authenticate requests; refresh tokens only buy a new pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims
///
/// Payload of every JWT issued by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: id of the guest, member or admin.
    pub sub: Uuid,
    pub role: Role,
    /// Session the token belongs to.
    pub sid: Uuid,
    pub kind: TokenKind,
    /// Unique token id. For refresh tokens it must equal the session's `refresh_jti`.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub session_id: Uuid,
}

/// MemberUser
///
/// An `AuthUser` whose role is `member`; any other role is rejected with 403.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberUser(pub AuthUser);

/// AdminUser
///
/// An `AuthUser` whose role is `admin`; any other role is rejected with 403.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser(pub AuthUser);

// --- Passwords ---

/// Hashes a password with Argon2id off the async runtime.
pub async fn hash_password(password: String, memory_kib: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || {
        let params = Params::new(memory_kib, 2, 1, None)
            .map_err(|e| AppError::Internal(format!("argon2 params: {e}")))?;
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
}

/// Verifies a password against a PHC-encoded hash. Malformed hashes never verify.
pub async fn verify_password(password: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || {
        PasswordHash::new(&hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    })
    .await
    .unwrap_or(false)
}

// --- Tokens ---

fn encode_claims(config: &AppConfig, claims: &Claims) -> AppResult<String> {
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &key)
        .map_err(|e| AppError::Internal(format!("token encoding failed: {e}")))
}

/// Decodes and validates a token of the expected kind. Any failure is a 401.
pub fn decode_token(config: &AppConfig, token: &str, kind: TokenKind) -> AppResult<Claims> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &key, &validation)
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected token");
            AppError::Unauthorized
        })?
        .claims;

    if claims.kind != kind {
        return Err(AppError::Unauthorized);
    }
    Ok(claims)
}

/// Signs an access/refresh pair for `session`. The refresh token expires with the session.
pub fn issue_token_pair(
    config: &AppConfig,
    session: &Session,
    now: DateTime<Utc>,
) -> AppResult<TokenPair> {
    let access_expires_at = now + Duration::seconds(config.access_token_ttl_secs);
    let refresh_expires_at = session.expires_at;

    let access = Claims {
        sub: session.actor_id,
        role: session.actor_role,
        sid: session.id,
        kind: TokenKind::Access,
        jti: Uuid::new_v4(),
        iat: now.timestamp(),
        exp: access_expires_at.timestamp(),
    };
    let refresh = Claims {
        kind: TokenKind::Refresh,
        jti: session.refresh_jti,
        exp: refresh_expires_at.timestamp(),
        ..access.clone()
    };

    Ok(TokenPair {
        access_token: encode_claims(config, &access)?,
        refresh_token: encode_claims(config, &refresh)?,
        access_expires_at,
        refresh_expires_at,
    })
}

/// Opens a new session for an actor and returns its first token pair.
pub async fn start_session(
    repo: &RepositoryState,
    config: &AppConfig,
    role: Role,
    actor_id: Uuid,
    user_agent: Option<String>,
) -> AppResult<TokenPair> {
    let now = Utc::now();
    let session = repo
        .create_session(NewSession {
            id: Uuid::new_v4(),
            actor_role: role,
            actor_id,
            refresh_jti: Uuid::new_v4(),
            user_agent,
            expires_at: now + Duration::seconds(config.refresh_token_ttl_secs),
        })
        .await?;
    tracing::info!(%role, %actor_id, session_id = %session.id, "session started");
    issue_token_pair(config, &session, now)
}

/// Exchanges a refresh token for a new pair, rotating the session's `refresh_jti`
/// so the presented token cannot be replayed.
pub async fn refresh_session(
    repo: &RepositoryState,
    config: &AppConfig,
    expected_role: Role,
    refresh_token: &str,
) -> AppResult<TokenPair> {
    let claims = decode_token(config, refresh_token, TokenKind::Refresh)?;
    if claims.role != expected_role {
        return Err(AppError::Unauthorized);
    }

    let now = Utc::now();
    let session = repo
        .get_session(claims.sid)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !session.is_active(now)
        || session.actor_id != claims.sub
        || session.actor_role != claims.role
        || session.refresh_jti != claims.jti
    {
        tracing::warn!(session_id = %claims.sid, "refresh token rejected");
        return Err(AppError::Unauthorized);
    }
    if !actor_exists(repo, claims.role, claims.sub).await? {
        return Err(AppError::Unauthorized);
    }

    let rotated = repo
        .rotate_session(
            session.id,
            session.refresh_jti,
            Uuid::new_v4(),
            now + Duration::seconds(config.refresh_token_ttl_secs),
        )
        .await?
        // Lost a race with a concurrent refresh of the same token.
        .ok_or(AppError::Unauthorized)?;
    tracing::info!(role = %claims.role, actor_id = %claims.sub, session_id = %rotated.id, "session refreshed");
    issue_token_pair(config, &rotated, now)
}

async fn actor_exists(repo: &RepositoryState, role: Role, id: Uuid) -> AppResult<bool> {
    Ok(match role {
        Role::Guest => repo.get_guest(id).await?.is_some(),
        Role::Member => repo.get_member(id).await?.is_some(),
        Role::Admin => repo.get_admin(id).await?.is_some(),
    })
}

/// Reads the `User-Agent` header, truncated to a storable length.
pub fn user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|ua| ua.chars().take(512).collect())
}

// --- Extractors ---

/// AuthUser Extractor Implementation
///
/// 1. Token Extraction: `Authorization: Bearer <access token>`.
/// 2. Token Validation: signature, expiry and `kind = access`.
/// 3. Session Check: the named session must be active and belong to `sub`.
/// 4. Actor Check: the guest/member/admin must still exist (soft-deleted actors are rejected).
///
/// Rejection: `AppError::Unauthorized` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let claims = decode_token(&config, token, TokenKind::Access)?;

        let session = repo
            .get_session(claims.sid)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if !session.is_active(Utc::now())
            || session.actor_id != claims.sub
            || session.actor_role != claims.role
        {
            return Err(AppError::Unauthorized);
        }

        if !actor_exists(&repo, claims.role, claims.sub).await? {
            return Err(AppError::Unauthorized);
        }

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
            session_id: claims.sid,
        })
    }
}

impl<S> FromRequestParts<S> for MemberUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Member {
            return Err(AppError::forbidden("member account required"));
        }
        Ok(MemberUser(user))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(AppError::forbidden("admin account required"));
        }
        Ok(AdminUser(user))
    }
}
