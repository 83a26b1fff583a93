//! Input validation for API requests.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Simple local@domain.tld shape; the store's UNIQUE constraint handles
    /// duplicates.
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Validate a signup email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate an optional display name
pub fn validate_name(name: &Option<String>) -> Result<(), String> {
    if let Some(n) = name {
        if n.len() > 100 {
            return Err("Name is too long (max 100 characters)".to_string());
        }
    }

    Ok(())
}

/// Validate optional admin notes
pub fn validate_notes(notes: &Option<String>) -> Result<(), String> {
    if let Some(n) = notes {
        if n.len() > 1000 {
            return Err("Notes are too long (max 1000 characters)".to_string());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.co").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("spaces in@example.com").is_err());
        assert!(validate_email("two@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limit() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_name_limits() {
        assert!(validate_name(&None).is_ok());
        assert!(validate_name(&Some("Ada Lovelace".to_string())).is_ok());
        assert!(validate_name(&Some("x".repeat(101))).is_err());
    }

    #[test]
    fn test_notes_limits() {
        assert!(validate_notes(&None).is_ok());
        assert!(validate_notes(&Some("x".repeat(1001))).is_err());
    }
}
