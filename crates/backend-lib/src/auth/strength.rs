// ============================
// backend-lib/src/auth/strength.rs
// ============================
//! Password strength policy applied at registration time.
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default minimum password length; a password must be strictly longer
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Password complexity requirements.
///
/// Each rule can be switched off on its own; `min_length` is always applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    pub min_length: usize,
    pub require_letters: bool,
    pub require_digits: bool,
    pub require_uppercase: bool,
    pub require_special: bool,
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            require_letters: true,
            require_digits: true,
            require_uppercase: true,
            require_special: true,
        }
    }
}

/// Unicode punctuation (`P*`) or symbol (`S*`) general categories
static SPECIAL_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{P}\p{S}]$").unwrap());

/// Character classes, tested in this order; the first match wins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Digit,
    Upper,
    Letter,
    Special,
    Other,
}

fn classify(c: char) -> CharClass {
    if c.is_numeric() {
        CharClass::Digit
    } else if c.is_uppercase() {
        CharClass::Upper
    } else if c.is_alphabetic() || c == ' ' {
        CharClass::Letter
    } else if SPECIAL_CHAR.is_match(c.encode_utf8(&mut [0u8; 4])) {
        CharClass::Special
    } else {
        CharClass::Other
    }
}

impl PasswordRequirements {
    /// Scan the password once and record which rules it satisfies
    pub fn verify(&self, password: &str) -> StrengthReport {
        let mut report = StrengthReport {
            has_min_length: password.chars().count() > self.min_length,
            has_letter: false,
            has_digit: false,
            has_upper: false,
            has_special: false,
            requirements: self.clone(),
        };

        for c in password.chars() {
            match classify(c) {
                CharClass::Digit => report.has_digit = true,
                // an upper-case letter is still a letter
                CharClass::Upper => {
                    report.has_upper = true;
                    report.has_letter = true;
                },
                CharClass::Letter => report.has_letter = true,
                CharClass::Special => report.has_special = true,
                CharClass::Other => {},
            }
        }

        report
    }
}

/// Outcome of [`PasswordRequirements::verify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrengthReport {
    pub has_min_length: bool,
    pub has_letter: bool,
    pub has_digit: bool,
    pub has_upper: bool,
    pub has_special: bool,
    requirements: PasswordRequirements,
}

impl StrengthReport {
    /// True when every required rule is met
    pub fn is_valid(&self) -> bool {
        self.error_messages().is_empty()
    }

    /// One message per failed rule, in a fixed order:
    /// length, letters, digits, upper case, special characters.
    pub fn error_messages(&self) -> Vec<String> {
        let req = &self.requirements;
        let mut messages = Vec::new();
        if !self.has_min_length {
            messages.push(format!("length should be greater than {}", req.min_length));
        }
        if req.require_letters && !self.has_letter {
            messages.push("should contain letters".to_string());
        }
        if req.require_digits && !self.has_digit {
            messages.push("should contain numbers".to_string());
        }
        if req.require_uppercase && !self.has_upper {
            messages.push("should contain upper case letters".to_string());
        }
        if req.require_special && !self.has_special {
            messages.push("should contain special characters".to_string());
        }
        messages
    }
}
