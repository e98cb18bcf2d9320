// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.

use crate::auth::PasswordRequirements;
use regex::Regex;
use std::sync::LazyLock;
use usersvc_common::UserIn;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$").unwrap());

/// Check if an email address is acceptable
pub fn is_email_valid(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Password strength messages, each prefixed with the field name
pub fn password_errors(password: &str, requirements: &PasswordRequirements) -> Vec<String> {
    requirements
        .verify(password)
        .error_messages()
        .into_iter()
        .map(|msg| format!("password: {msg}"))
        .collect()
}

/// Validate a registration payload.
///
/// Every problem is reported; the messages are joined with `"; "`.
pub fn validate_user(user: &UserIn, requirements: &PasswordRequirements) -> Result<(), String> {
    let mut errors = Vec::new();

    if user.first_name.is_empty() {
        errors.push("firstName: may not be empty".to_string());
    }
    if user.last_name.is_empty() {
        errors.push("lastName: may not be empty".to_string());
    }
    if user.email.is_empty() {
        errors.push("email: may not be empty".to_string());
    } else if !is_email_valid(&user.email) {
        errors.push("email: invalid".to_string());
    }
    if user.password.is_empty() {
        errors.push("password: may not be empty".to_string());
    } else {
        errors.extend(password_errors(&user.password, requirements));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}
