//! Shelf naming rules.

/// Name given to the default shelf created alongside every user.
pub const DEFAULT_SHELF_NAME: &str = "Library";

/// Maximum shelf name length in characters.
pub const MAX_SHELF_NAME_LEN: usize = 100;

/// Validate and normalize a shelf name.
///
/// Surrounding whitespace is trimmed; the result must be non-empty, at most
/// [`MAX_SHELF_NAME_LEN`] characters, and free of control characters.
pub fn normalize_shelf_name(name: &str) -> crate::Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(crate::Error::InvalidShelfName(
            "shelf name cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_SHELF_NAME_LEN {
        return Err(crate::Error::InvalidShelfName(format!(
            "shelf name exceeds {MAX_SHELF_NAME_LEN} characters"
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(crate::Error::InvalidShelfName(
            "shelf name contains control characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
