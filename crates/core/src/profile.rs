//! Profile field rules.

/// Minimum username length in characters.
pub const MIN_USERNAME_LEN: usize = 3;

/// Maximum username length in characters.
pub const MAX_USERNAME_LEN: usize = 64;

/// Validate and normalize a username: trimmed, [`MIN_USERNAME_LEN`] to
/// [`MAX_USERNAME_LEN`] characters, no whitespace or control characters.
pub fn normalize_username(username: &str) -> crate::Result<String> {
    let trimmed = username.trim();
    let len = trimmed.chars().count();
    if len < MIN_USERNAME_LEN {
        return Err(crate::Error::InvalidUsername(format!(
            "username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if len > MAX_USERNAME_LEN {
        return Err(crate::Error::InvalidUsername(format!(
            "username exceeds {MAX_USERNAME_LEN} characters"
        )));
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(crate::Error::InvalidUsername(
            "username cannot contain whitespace".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate and normalize a bare `local@domain` email address.
pub fn normalize_email(email: &str) -> crate::Result<String> {
    let trimmed = email.trim();
    let invalid = || crate::Error::InvalidEmail(trimmed.to_string());

    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid());
    }
    let (local, domain) = trimmed.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if domain.split('.').any(str::is_empty) {
        return Err(invalid());
    }
    Ok(trimmed.to_string())
}
