use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError::{self, MalformedPayload};

pub const MAX_ID_LENGTH: usize = 64;
pub const MAX_COMMENT_LENGTH: usize = 500;

static ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

pub fn validate_id<'a>(field: &str, id: &'a str) -> Result<&'a str, AppError> {
    let id = id.trim();

    if id.is_empty() || id.len() > MAX_ID_LENGTH {
        return Err(MalformedPayload(format!(
            "{field} must be 1 to {MAX_ID_LENGTH} characters"
        )));
    }

    if !ID.is_match(id) {
        return Err(MalformedPayload(format!(
            "{field} can only contain letters, numbers, underscores and dashes"
        )));
    }

    Ok(id)
}

/// Trims the comment, turning blank ones into `None`.
pub fn sanitize_comment(comment: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(comment) = comment.map(str::trim).filter(|comment| !comment.is_empty()) else {
        return Ok(None);
    };

    if comment.chars().count() > MAX_COMMENT_LENGTH {
        return Err(MalformedPayload(format!(
            "comment must be at most {MAX_COMMENT_LENGTH} characters"
        )));
    }

    Ok(Some(comment.to_string()))
}
