//! Input normalisation shared by every create request.

use crate::error::{AppError, Result};

pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LENGTH: usize = 32;

/// Trim and require a non-empty value no longer than `max` characters
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::invalid(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(AppError::invalid(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// Trim an optional value; blank becomes `None`
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => required_text(field, v, max).map(Some),
        None => Ok(None),
    }
}

/// Lowercase, trim and de-duplicate tags, keeping first-seen order
pub fn clean_tags(tags: &[String]) -> Result<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').to_lowercase();
        if tag.is_empty() || cleaned.contains(&tag) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(AppError::invalid(format!(
                "Tags must be at most {} characters",
                MAX_TAG_LENGTH
            )));
        }
        cleaned.push(tag);
    }
    if cleaned.len() > MAX_TAGS {
        return Err(AppError::invalid(format!("At most {} tags allowed", MAX_TAGS)));
    }
    Ok(cleaned)
}
