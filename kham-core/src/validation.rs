//! Input validation for account, profile and leaderboard data.
//!
//! Anything arriving from a form or request body goes through these
//! validators before it touches stored records.

use thiserror::Error;

use crate::schema::{CharacterId, Period, CHARACTER_COUNT};

/// Minimum username length, in characters.
pub const MIN_USERNAME_LEN: usize = 3;
/// Maximum username length, in characters.
pub const MAX_USERNAME_LEN: usize = 32;
/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 1;
/// Maximum password length, in bytes.
pub const MAX_PASSWORD_LEN: usize = 128;
/// Maximum display name length, in characters.
pub const MAX_DISPLAY_NAME_LEN: usize = 50;
/// Leaderboard rows returned when no limit is given.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 100;
/// Largest leaderboard page.
pub const MAX_LEADERBOARD_LIMIT: usize = 1000;

/// Validation error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Username or password missing.
    #[error("username and password are required")]
    MissingCredentials,
    /// Username shorter than the minimum.
    #[error("username must be at least {MIN_USERNAME_LEN} characters")]
    UsernameTooShort,
    /// Username longer than the maximum.
    #[error("username too long (max {MAX_USERNAME_LEN} chars)")]
    UsernameTooLong,
    /// Username contains whitespace or control characters.
    #[error("username contains invalid characters")]
    UsernameInvalidChars,
    /// Password longer than the maximum.
    #[error("password too long (max {MAX_PASSWORD_LEN} bytes)")]
    PasswordTooLong,
    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,
    /// Display name empty after trimming.
    #[error("display name is required")]
    DisplayNameMissing,
    /// Display name longer than the maximum.
    #[error("display name too long (max {MAX_DISPLAY_NAME_LEN} chars)")]
    DisplayNameTooLong,
    /// No character chosen.
    #[error("a character must be selected")]
    CharacterMissing,
    /// Character id outside `1..=6`.
    #[error("character id must be between 1 and {CHARACTER_COUNT}")]
    CharacterInvalid,
    /// Unknown leaderboard period.
    #[error("unknown leaderboard period: {0}")]
    InvalidPeriod(String),
    /// Leaderboard limit out of range.
    #[error("limit must be between 1 and {MAX_LEADERBOARD_LIMIT}")]
    InvalidLimit,
}

/// Validate a username and return it trimmed.
///
/// # Errors
///
/// Returns [`ValidationError::MissingCredentials`] when empty,
/// [`ValidationError::UsernameTooShort`] / [`ValidationError::UsernameTooLong`]
/// on length, and [`ValidationError::UsernameInvalidChars`] for whitespace or
/// control characters.
pub fn validate_username(username: &str) -> Result<&str, ValidationError> {
    let username = username.trim();
    let len = username.chars().count();
    if len == 0 {
        return Err(ValidationError::MissingCredentials);
    }
    if len < MIN_USERNAME_LEN {
        return Err(ValidationError::UsernameTooShort);
    }
    if len > MAX_USERNAME_LEN {
        return Err(ValidationError::UsernameTooLong);
    }
    if username
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(username)
}

/// Validate a password.
///
/// # Errors
///
/// Returns [`ValidationError::MissingCredentials`] or
/// [`ValidationError::PasswordTooLong`].
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::MissingCredentials);
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

/// Validate login credentials and return the trimmed username.
///
/// Length rules are not applied to the username here so that a wrong
/// username reads as a failed login rather than a form error.
///
/// # Errors
///
/// Returns [`ValidationError::MissingCredentials`] when either field is empty.
pub fn validate_login<'a>(username: &'a str, password: &str) -> Result<&'a str, ValidationError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(username)
}

/// Validate the registration form and return the trimmed username.
///
/// # Errors
///
/// Any username or password error, or [`ValidationError::PasswordMismatch`].
pub fn validate_registration<'a>(
    username: &'a str,
    password: &str,
    confirm: &str,
) -> Result<&'a str, ValidationError> {
    let username = validate_username(username)?;
    validate_password(password)?;
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(username)
}

/// Validate a display name and return it trimmed.
///
/// # Errors
///
/// Returns [`ValidationError::DisplayNameMissing`] or
/// [`ValidationError::DisplayNameTooLong`].
pub fn validate_display_name(name: &str) -> Result<&str, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::DisplayNameMissing);
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ValidationError::DisplayNameTooLong);
    }
    Ok(name)
}

/// Validate a character choice.
///
/// # Errors
///
/// Returns [`ValidationError::CharacterMissing`] for `None` and
/// [`ValidationError::CharacterInvalid`] outside `1..=6`.
pub fn validate_character(id: Option<i64>) -> Result<CharacterId, ValidationError> {
    let id = id.ok_or(ValidationError::CharacterMissing)?;
    u8::try_from(id)
        .ok()
        .and_then(CharacterId::new)
        .ok_or(ValidationError::CharacterInvalid)
}

/// Parse a leaderboard period.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPeriod`].
pub fn validate_period(period: &str) -> Result<Period, ValidationError> {
    period
        .parse()
        .map_err(|_| ValidationError::InvalidPeriod(period.to_string()))
}

/// Resolve a leaderboard page size.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidLimit`] for zero or more than 1000.
pub fn validate_limit(limit: Option<usize>) -> Result<usize, ValidationError> {
    match limit {
        None => Ok(DEFAULT_LEADERBOARD_LIMIT),
        Some(n) if (1..=MAX_LEADERBOARD_LIMIT).contains(&n) => Ok(n),
        Some(_) => Err(ValidationError::InvalidLimit),
    }
}
