//! Input validation functions
//!
//! This module provides validation utilities for credential input.

use validator::ValidateEmail;

/// Validate email format
///
/// Emails are checked as received; no case folding is applied, so
/// `User@Example.com` and `user@example.com` are distinct accounts.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    if !email.validate_email() {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate that a named field is not blank
pub fn validate_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    Ok(())
}
