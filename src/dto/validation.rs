//! Validation helpers for inbound command payloads.

use validator::ValidationError;

/// Longest display name accepted at join time.
const MAX_DISPLAY_NAME_LENGTH: usize = 32;

/// Validates that a session code is 6 alphanumeric characters.
///
/// Case is not checked here; codes are uppercased during parsing, so
/// `ab12cd` and `AB12CD` are both accepted and address the same session.
pub fn validate_session_code(code: &str) -> Result<(), ValidationError> {
    let trimmed = code.trim();
    if trimmed.len() != 6 || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("session_code");
        err.message = Some("session code must be 6 letters or digits".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a display name is non-empty once trimmed and not
/// unreasonably long.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("display_name");
        err.message = Some("display name must not be empty".into());
        return Err(err);
    }
    if trimmed.len() > MAX_DISPLAY_NAME_LENGTH {
        let mut err = ValidationError::new("display_name");
        err.message = Some(
            format!("display name must be at most {MAX_DISPLAY_NAME_LENGTH} characters").into(),
        );
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_session_code_valid() {
        assert!(validate_session_code("ABC123").is_ok());
        assert!(validate_session_code("abc123").is_ok());
        assert!(validate_session_code(" ABC123 ").is_ok());
    }

    #[test]
    fn test_validate_session_code_invalid() {
        assert!(validate_session_code("").is_err());
        assert!(validate_session_code("ABC12").is_err()); // too short
        assert!(validate_session_code("ABC1234").is_err()); // too long
        assert!(validate_session_code("AB-12C").is_err()); // punctuation
    }

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("ada").is_ok());
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"x".repeat(33)).is_err());
    }
}
