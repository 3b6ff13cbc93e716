//! User domain models

use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

/// A registered principal as seen by the authentication core.
///
/// The password hash is wrapped in `Secret` so `Debug` output and log
/// fields never contain it.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Lookup key presented at login
    pub username: String,
    /// Stable identifier written into the token subject
    pub subject: String,
    pub password_hash: Secret<String>,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn new(
        username: impl Into<String>,
        subject: impl Into<String>,
        password_hash: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        Self {
            username: username.into(),
            subject: subject.into(),
            password_hash: Secret::new(password_hash.into()),
            roles,
        }
    }

    pub fn password_hash(&self) -> &str {
        self.password_hash.expose_secret()
    }
}

/// Current user response (without sensitive data)
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub subject: String,
    pub roles: Vec<String>,
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password_hash() {
        let identity = Identity::new(
            "alice",
            "alice",
            "$argon2id$v=19$m=64,t=1,p=1$c2FsdA$aGFzaA",
            vec!["USER".to_string()],
        );

        let debug = format!("{:?}", identity);
        assert!(!debug.contains("argon2id"));
        assert!(debug.contains("alice"));
        assert_eq!(identity.password_hash(), "$argon2id$v=19$m=64,t=1,p=1$c2FsdA$aGFzaA");
    }
}
