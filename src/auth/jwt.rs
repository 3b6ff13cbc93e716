//! JWT token issuance and validation
//! Stateless HS256 access tokens; nothing is stored server side

use crate::{
    config::SecurityConfig,
    error::{AppError, AuthError},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::{ops::RangeInclusive, sync::Arc};
use uuid::Uuid;

/// Minimum HS256 secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Accepted access token lifetimes (1 minute to 24 hours)
pub const ACCESS_TOKEN_TTL_SECS: RangeInclusive<u64> = 60..=86400;

/// JWT claims carried by every access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (stable user identifier)
    pub sub: String,

    /// Role labels
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

/// Freshly issued token as handed back to the client
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64, // seconds until the token expires
}

/// Time source for issuance and expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Token codec.
///
/// Holds the process-wide signing key. The key is fixed at construction and
/// the codec is shared read-only across requests.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_exp_secs: u64,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create codec from config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create codec from config with an explicit time source
    pub fn with_clock(config: &SecurityConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let secret = config.jwt_secret.expose_secret();

        // Ensure secret is at least 32 bytes for HS256
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        if !ACCESS_TOKEN_TTL_SECS.contains(&config.access_token_exp_secs) {
            return Err(AppError::Config(format!(
                "Access token lifetime {}s outside {}..={}",
                config.access_token_exp_secs,
                ACCESS_TOKEN_TTL_SECS.start(),
                ACCESS_TOKEN_TTL_SECS.end()
            )));
        }

        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        // Expiry is checked against our own clock after the signature passes
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            access_token_exp_secs: config.access_token_exp_secs,
            clock,
        })
    }

    /// Configured access token lifetime
    pub fn access_token_ttl(&self) -> Duration {
        Duration::seconds(self.access_token_exp_secs as i64)
    }

    /// Sign a token for `subject` carrying `roles`, valid for `ttl`
    pub fn issue(&self, subject: &str, roles: &[String], ttl: Duration) -> Result<String, AppError> {
        if ttl <= Duration::zero() {
            return Err(AppError::Internal("Token ttl must be positive".to_string()));
        }

        let now = self.clock.now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal("Token expiry overflow".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            roles: roles.to_vec(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::Internal(format!("Failed to encode access token: {}", e))
        })
    }

    /// Sign an access token with the configured lifetime
    pub fn issue_access_token(&self, subject: &str, roles: &[String]) -> Result<IssuedToken, AppError> {
        let access_token = self.issue(subject, roles, self.access_token_ttl())?;

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_in: self.access_token_exp_secs,
        })
    }

    /// Validate and decode a token.
    ///
    /// The signature is checked before any claim is read; an expired token
    /// fails even when its signature is good.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                let err = classify(e.kind());
                tracing::debug!(reason = err.reason(), "Token validation failed: {:?}", e);
                err
            })?
            .claims;

        let now = self.clock.now().timestamp();
        if now > claims.exp {
            tracing::debug!(sub = %claims.sub, exp = claims.exp, now, "Token expired");
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        // A token signed under another algorithm cannot be verified with our key
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::Malformed,
    }
}
