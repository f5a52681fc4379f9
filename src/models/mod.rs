//! Request/response schemas and persistence rows, grouped by area.

pub mod actors;
pub mod admin;
pub mod community;
pub mod content;
pub mod moderation;
pub mod pagination;

pub use actors::*;
pub use admin::*;
pub use community::*;
pub use content::*;
pub use moderation::*;
pub use pagination::{Page, PageRequest, Pagination};

use crate::error::{AppError, AppResult};

/// Rejects `value` unless its character count is within `min..=max`.
pub(crate) fn check_len(field: &str, value: &str, min: usize, max: usize) -> AppResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

/// Lower-case handle made of ASCII letters, digits and underscores.
pub(crate) fn check_handle(field: &str, value: &str, min: usize, max: usize) -> AppResult<()> {
    check_len(field, value, min, max)?;
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(AppError::validation(format!(
            "{field} may only contain lowercase letters, digits and underscores"
        )));
    }
    Ok(())
}

pub(crate) fn check_not_blank(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be blank")));
    }
    Ok(())
}
