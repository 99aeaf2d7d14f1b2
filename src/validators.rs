/// Input validators for account creation and login
///
/// Emails are normalised (trimmed, lower-cased) before they are used as a
/// lookup key. Passwords are checked against the signup policy only; their
/// content is never echoed back in errors.

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::MAX_PASSWORD_BYTES;
use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 3;
const MIN_PASSWORD_LENGTH: usize = 8;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*$"
    ).unwrap();
}

/// Validates and normalises an email address
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let normalised = email.trim().to_lowercase();

    if normalised.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if normalised.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if normalised.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(&normalised) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(normalised)
}

/// Validates a new password against the signup policy
///
/// The upper bound is bcrypt's input limit in bytes, so anything accepted
/// here can be hashed without truncation.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        ));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_BYTES,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email_is_normalised() {
        assert_eq!(
            is_valid_email("  Walt@Breakingbad.COM "),
            Ok("walt@breakingbad.com".to_string())
        );
    }

    #[test]
    fn test_invalid_emails() {
        for email in ["", "notanemail", "user@", "@example.com", "user@@example.com"] {
            assert!(is_valid_email(email).is_err(), "accepted {:?}", email);
        }
    }

    #[test]
    fn test_too_long_email() {
        let email = format!("{}@example.com", "a".repeat(MAX_EMAIL_LENGTH));
        assert!(matches!(
            is_valid_email(&email),
            Err(ValidationError::TooLong(_, MAX_EMAIL_LENGTH))
        ));
    }

    #[test]
    fn test_password_policy() {
        assert!(is_valid_password("Cat is Best!").is_ok());
        assert_eq!(
            is_valid_password(""),
            Err(ValidationError::EmptyField("password".to_string()))
        );
        assert!(matches!(
            is_valid_password("short"),
            Err(ValidationError::TooShort(_, MIN_PASSWORD_LENGTH))
        ));
        assert!(matches!(
            is_valid_password(&"a".repeat(MAX_PASSWORD_BYTES + 1)),
            Err(ValidationError::TooLong(_, MAX_PASSWORD_BYTES))
        ));
    }

    #[test]
    fn test_password_limit_counts_bytes() {
        // 25 three-byte characters = 75 bytes
        let password = "한".repeat(25);
        assert!(is_valid_password(&password).is_err());
    }
}
