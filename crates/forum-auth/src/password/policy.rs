//! Username and password acceptance rules applied at registration.

use forum_core::error::AppError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 32;
pub const PASSWORD_MAX: usize = 128;

/// Usernames are 3..=32 characters of ASCII letters, digits, `_`, `.` or `-`.
pub fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(AppError::validation(format!(
            "Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(AppError::validation(
            "Username may only contain letters, digits, '_', '.' and '-'",
        ));
    }
    Ok(())
}

/// Passwords must be at least `min_len` (and at least one) characters and
/// at most 128.
pub fn validate_password(password: &str, min_len: usize) -> Result<(), AppError> {
    let min_len = min_len.max(1);
    let len = password.chars().count();
    if !(min_len..=PASSWORD_MAX).contains(&len) {
        return Err(AppError::validation(format!(
            "Password must be between {min_len} and {PASSWORD_MAX} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usernames() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.b-c_d").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("alice smith").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_passwords() {
        assert!(validate_password("password1", 8).is_ok());
        assert!(validate_password("short", 8).is_err());
        assert!(validate_password("pw1", 3).is_ok());
        assert!(validate_password("", 0).is_err());
        assert!(validate_password(&"p".repeat(129), 3).is_err());
    }
}
