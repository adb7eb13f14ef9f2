//! Password strength scoring for the wallet password.

use serde::Serialize;

/// Score breakdown for a candidate password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    /// 0..=6, one point per satisfied rule.
    pub score: u8,
    pub feedback: &'static str,
    pub is_valid: bool,
}

/// Minimum length for an acceptable password.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Minimum score for an acceptable password.
pub const MIN_PASSWORD_SCORE: u8 = 4;

/// Score a password.
///
/// One point each for: at least 8 characters, at least 12 characters, an
/// uppercase letter, a lowercase letter, a digit, and any other character.
/// Valid when the score is at least 4 and the length at least 8.
pub fn validate_password_strength(password: &str) -> PasswordStrength {
    let len = password.chars().count();
    let rules = [
        len >= MIN_PASSWORD_LEN,
        len >= 12,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = rules.iter().filter(|r| **r).count() as u8;

    let feedback = match score {
        0..=2 => "Weak password. Add more characters and complexity.",
        3..=4 => "Medium strength. Consider adding special characters.",
        _ => "Strong password!",
    };

    PasswordStrength {
        score,
        feedback,
        is_valid: score >= MIN_PASSWORD_SCORE && len >= MIN_PASSWORD_LEN,
    }
}
