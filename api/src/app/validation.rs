//! Input normalization shared by the services

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AppError, DomainError};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Parties and responsibles
pub const MAX_NAME_LEN: usize = 200;
/// Entry channels, situations and referrals
pub const MAX_LOOKUP_NAME_LEN: usize = 100;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

/// Clamp pagination parameters to `1..=MAX_LIMIT` and a non-negative offset
pub fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// Trim a required name and enforce its length in characters
pub fn name(field: &str, raw: &str, max: usize) -> Result<String, AppError> {
    let trimmed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let len = trimmed.chars().count();

    if len == 0 || len > max {
        return Err(AppError::Domain(DomainError::Validation(format!(
            "{} must be between 1 and {} characters",
            field, max
        ))));
    }

    Ok(trimmed)
}

/// Lowercase and check the shape of an email address
pub fn email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();

    if !email_regex().is_match(&email) {
        return Err(AppError::Domain(DomainError::Validation(format!(
            "Invalid email: {}",
            raw.trim()
        ))));
    }

    Ok(email)
}

/// Blank optional strings become `None`
pub fn optional(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
