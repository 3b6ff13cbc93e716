//! Authentication-related models

use serde::Deserialize;
use validator::Validate;

/// Login request
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255, message = "Username must be 1 to 255 characters"))]
    pub username: String,
    #[validate(length(min = 8, max = 72, message = "Password must be 8 to 72 characters"))]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login response
pub type LoginResponse = crate::auth::jwt::IssuedToken;

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_login_request_validation() {
        assert!(request("alice", "correct-pass").validate().is_ok());
        assert!(request("", "correct-pass").validate().is_err());
        assert!(request("alice", "short").validate().is_err());
        assert!(request("alice", &"x".repeat(73)).validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", request("alice", "correct-pass"));
        assert!(!debug.contains("correct-pass"));
    }
}
