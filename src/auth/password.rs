//! Password hashing and verification using Argon2id

use crate::{config::SecurityConfig, error::AppError};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Plaintext hashed once at construction; `dummy_verify` checks against it.
const DUMMY_PASSWORD: &str = "card-auth-timing-equalizer";

/// Password hasher with configurable parameters
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl PasswordHasher {
    /// Create hasher with default parameters (OWASP recommended)
    pub fn new() -> Result<Self, AppError> {
        // m=64MiB, t=3 iterations, p=4 lanes
        Self::with_params(65536, 3, 4)
    }

    /// Create hasher from the security section of the config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::with_params(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
        )
    }

    /// Create hasher with explicit Argon2id cost parameters
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            AppError::Config(format!("Invalid Argon2 params: {}", e))
        })?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, DUMMY_PASSWORD)?;

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a password into a PHC string with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash_with(&self.argon2, password)
    }

    /// Verify a password against a PHC hash.
    ///
    /// Never errors: an unparseable digest is treated as a mismatch.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Failed to parse password hash: {:?}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Burn the same amount of work as a real verification.
    ///
    /// Used on the unknown-user path so response timing does not reveal
    /// whether a username exists.
    pub fn dummy_verify(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }
}

fn hash_with(argon2: &Argon2<'static>, password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!("Failed to hash password: {:?}", e);
            AppError::Internal(format!("Failed to hash password: {}", e))
        })?
        .to_string();

    Ok(password_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal cost so the suite stays fast
    fn hasher() -> PasswordHasher {
        PasswordHasher::with_params(64, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("correct-pass").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct-pass", &hash));
    }

    #[test]
    fn test_verify_fails_with_wrong_password() {
        let hasher = hasher();
        let hash = hasher.hash("correct-pass").unwrap();

        assert!(!hasher.verify("wrong-pass", &hash));
    }

    #[test]
    fn test_hash_is_different_each_time() {
        let hasher = hasher();

        let hash1 = hasher.hash("correct-pass").unwrap();
        let hash2 = hasher.hash("correct-pass").unwrap();

        // Salted
        assert_ne!(hash1, hash2);
        assert!(hasher.verify("correct-pass", &hash1));
        assert!(hasher.verify("correct-pass", &hash2));
    }

    #[test]
    fn test_verify_malformed_digest_fails_closed() {
        let hasher = hasher();

        assert!(!hasher.verify("correct-pass", ""));
        assert!(!hasher.verify("correct-pass", "not-a-phc-string"));
        assert!(!hasher.verify("correct-pass", "$argon2id$v=19$m=64,t=1,p=1$"));
        assert!(!hasher.verify("correct-pass", "$unknown$v=1$abc$def"));
    }

    #[test]
    fn test_verify_uses_params_embedded_in_digest() {
        let weak = hasher();
        let stronger = PasswordHasher::with_params(128, 2, 1).unwrap();

        let hash = weak.hash("correct-pass").unwrap();
        assert!(stronger.verify("correct-pass", &hash));
    }

    #[test]
    fn test_default_params_are_owasp() {
        let hasher = PasswordHasher::new().unwrap();
        let hash = hasher.hash("correct-pass").unwrap();

        assert!(hash.contains("m=65536,t=3,p=4"));
        assert!(hasher.verify("correct-pass", &hash));
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(PasswordHasher::with_params(0, 0, 0).is_err());
    }
}
