//! Banned-word screening for user-authored text.

use crate::{error::AppError, models::BannedWord};

/// Returns the first banned entry found in `text`.
///
/// Single words match whole alphanumeric tokens, so "class" does not trip on "ass".
/// Entries containing whitespace are matched as case-insensitive substrings.
pub fn find_banned<'a>(text: &str, banned: &'a [BannedWord]) -> Option<&'a str> {
    if banned.is_empty() || text.is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    banned.iter().map(|b| b.word.as_str()).find(|word| {
        if word.contains(char::is_whitespace) {
            lowered.contains(word)
        } else {
            tokens.iter().any(|t| t == word)
        }
    })
}

/// Rejects the first field that contains a banned entry.
pub fn screen(fields: &[(&str, &str)], banned: &[BannedWord]) -> Result<(), AppError> {
    for (field, text) in fields {
        if let Some(word) = find_banned(text, banned) {
            return Err(AppError::validation(format!(
                "{field} contains a banned word: {word}"
            )));
        }
    }
    Ok(())
}
