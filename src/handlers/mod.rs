//! HTTP handlers, one module per resource. Every handler validates its input,
//! performs the repository calls and maps the result to a DTO or an `AppError`.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    AppState,
    error::AppResult,
    models::{BannedWord, DEFAULT_MAX_POST_BODY, PageRequest},
};

pub mod admin;
pub mod auth;
pub mod banned_words;
pub mod categories;
pub mod comments;
pub mod communities;
pub mod configurations;
pub mod health;
pub mod integrations;
pub mod me;
pub mod memberships;
pub mod posts;
pub mod recent;
pub mod reports;
pub mod uploads;
pub mod votes;

/// Configuration key overriding the maximum post body length.
pub const MAX_POST_BODY_KEY: &str = "post.max_body_length";

/// PageQuery
///
/// Plain `page`/`limit` query parameters for listings without extra filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number (default 1).
    pub page: Option<i64>,
    /// Page size, 1..=100 (default 20).
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page_request(&self) -> AppResult<PageRequest> {
        PageRequest::from_query(self.page, self.limit)
    }
}

pub(crate) async fn banned_words(state: &AppState) -> AppResult<Vec<BannedWord>> {
    Ok(state.repo.list_banned_words().await?)
}

/// Reads `post.max_body_length`, falling back to the built-in limit when the
/// entry is missing or not a positive integer.
pub(crate) async fn max_post_body(state: &AppState) -> AppResult<usize> {
    let Some(entry) = state.repo.get_configuration_by_key(MAX_POST_BODY_KEY).await? else {
        return Ok(DEFAULT_MAX_POST_BODY);
    };
    match entry.value.trim().parse::<usize>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => {
            tracing::warn!(value = %entry.value, "ignoring invalid {MAX_POST_BODY_KEY}");
            Ok(DEFAULT_MAX_POST_BODY)
        }
    }
}
