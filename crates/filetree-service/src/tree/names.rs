//! Node name rules.

use filetree_core::error::AppError;
use filetree_core::result::AppResult;

/// Longest accepted name, in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// Trim `name` and check it is usable as a node name.
///
/// Names are compared case-sensitively after trimming.
pub fn validate_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "Name cannot be longer than {MAX_NAME_LENGTH} characters"
        )));
    }
    if trimmed.contains('/') {
        return Err(AppError::validation("Name cannot contain '/'"));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(AppError::validation("Name cannot contain control characters"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Reports ").unwrap(), "Reports");
        assert_eq!(validate_name("a.b c").unwrap(), "a.b c");
        assert!(validate_name("   ").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("tab\there").is_err());
        assert!(validate_name(&"x".repeat(255)).is_ok());
        assert!(validate_name(&"x".repeat(256)).is_err());
    }
}
