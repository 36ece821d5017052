//! Input validation for user-entered and admin-entered fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid payment phone number.
    InvalidPhone(String),
    /// Invalid media URL.
    InvalidUrl(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidPhone(msg) => write!(f, "Invalid phone number: {}", msg),
            ValidationError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Minimum number of digits in a payment phone number (country code included).
pub const MIN_PHONE_DIGITS: usize = 10;

/// Maximum number of digits in a payment phone number (E.164 limit).
pub const MAX_PHONE_DIGITS: usize = 15;

/// Maximum allowed length for names and titles.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum allowed length for media URLs.
pub const MAX_URL_LENGTH: usize = 500;

/// Validate a phone number typed in for a mobile-money charge.
///
/// Only the payment-phone step validates; inbound sender numbers are trusted
/// as delivered by the provider.
pub fn validate_payment_phone(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Empty("phone number".to_string()));
    }

    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone(
            "must contain digits only".to_string(),
        ));
    }

    if phone.len() < MIN_PHONE_DIGITS {
        return Err(ValidationError::InvalidPhone(format!(
            "must have at least {} digits",
            MIN_PHONE_DIGITS
        )));
    }

    if phone.len() > MAX_PHONE_DIGITS {
        return Err(ValidationError::TooLong {
            field: "phone number".to_string(),
            max: MAX_PHONE_DIGITS,
            actual: phone.len(),
        });
    }

    Ok(())
}

/// Validate a display name or title.
pub fn validate_name(field: &str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    let len = value.chars().count();
    if len > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
            actual: len,
        });
    }

    Ok(())
}

/// Validate a publicly reachable media URL (image or video link).
pub fn validate_media_url(url: &str) -> Result<(), ValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::Empty("url".to_string()));
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "url".to_string(),
            max: MAX_URL_LENGTH,
            actual: url.len(),
        });
    }

    // The provider fetches media itself, so only absolute http(s) links work
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ValidationError::InvalidUrl(
            "must start with http:// or https://".to_string(),
        ));
    }

    if url.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidUrl(
            "must not contain whitespace".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_payment_phone_valid() {
        assert!(validate_payment_phone("255700000001").is_ok());
        assert!(validate_payment_phone("0712345678").is_ok());
        assert!(validate_payment_phone(" 255712345678 ").is_ok()); // trimmed
    }

    #[test]
    fn test_validate_payment_phone_invalid() {
        assert!(matches!(
            validate_payment_phone(""),
            Err(ValidationError::Empty(_))
        ));

        // Too short
        assert!(matches!(
            validate_payment_phone("071234567"),
            Err(ValidationError::InvalidPhone(_))
        ));

        // Non-digits
        assert!(matches!(
            validate_payment_phone("+255712345678"),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert!(matches!(
            validate_payment_phone("0712 345 678"),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert!(matches!(
            validate_payment_phone("status"),
            Err(ValidationError::InvalidPhone(_))
        ));

        // Too long
        assert!(matches!(
            validate_payment_phone("1234567890123456"),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Eliud").is_ok());
        assert!(validate_name("name", "Steve Mweusi").is_ok());

        assert!(matches!(
            validate_name("name", "   "),
            Err(ValidationError::Empty(_))
        ));

        let long_name = "a".repeat(101);
        assert!(matches!(
            validate_name("name", &long_name),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_media_url() {
        assert!(validate_media_url("https://cdn.example.com/v/intro.mp4").is_ok());
        assert!(validate_media_url("http://example.com/a.jpg").is_ok());

        assert!(matches!(
            validate_media_url(""),
            Err(ValidationError::Empty(_))
        ));
        assert!(matches!(
            validate_media_url("ftp://example.com/a.jpg"),
            Err(ValidationError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_media_url("https://example.com/a b.jpg"),
            Err(ValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::InvalidPhone("must contain digits only".to_string());
        assert_eq!(err.to_string(), "Invalid phone number: must contain digits only");

        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max: 100,
            actual: 120,
        };
        assert_eq!(err.to_string(), "name is too long (120 chars, max 100)");
    }
}
