//! Request gate: bearer token extraction and validation
//!
//! The gate itself is framework independent (`RequestGate::evaluate`); the
//! axum middleware below only adapts its outcome to the request pipeline.

use crate::{
    auth::jwt::TokenCodec,
    error::{AppError, AuthError},
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub subject: String,
    pub roles: Vec<String>,
    /// Token expiry (unix seconds)
    pub expires_at: i64,
}

impl AuthContext {
    /// Role check; case-insensitive, a leading `ROLE_` is ignored on both sides
    pub fn has_role(&self, role: &str) -> bool {
        let wanted = normalize_role(role);
        self.roles
            .iter()
            .any(|r| normalize_role(r).eq_ignore_ascii_case(wanted))
    }

    /// 403 unless the caller holds `role`
    ///
    /// ```
    /// use card_auth::{auth::AuthContext, error::AppError};
    ///
    /// async fn list_all_cards(ctx: AuthContext) -> Result<&'static str, AppError> {
    ///     ctx.require_role("ADMIN")?;
    ///     Ok("all cards")
    /// }
    /// ```
    pub fn require_role(&self, role: &str) -> Result<(), AppError> {
        if self.has_role(role) {
            Ok(())
        } else {
            tracing::warn!(subject = %self.subject, required = %role, "Missing role");
            Err(AppError::Forbidden)
        }
    }
}

fn normalize_role(role: &str) -> &str {
    match role.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("ROLE_") => &role[5..],
        _ => role,
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Per-request gate result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// No bearer token; downstream decides whether that is acceptable
    Unauthenticated,
    Authorized(AuthContext),
    Rejected(AuthError),
}

/// 从 Authorization 头提取 Bearer 令牌
///
/// `Ok(None)` when there is no header or it carries another scheme.
/// `Ok(Some(""))` means the bearer scheme was used without a token. A bearer
/// token that is not valid UTF-8 is `Malformed`.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    // Scheme and token may be separated by any run of whitespace, tabs included
    let bytes = value.as_bytes();
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let trimmed = &bytes[start..];
    let end = trimmed
        .iter()
        .position(u8::is_ascii_whitespace)
        .unwrap_or(trimmed.len());
    let (scheme, rest) = trimmed.split_at(end);

    if !scheme.eq_ignore_ascii_case(b"bearer") {
        return Ok(None);
    }

    std::str::from_utf8(rest)
        .map(|token| Some(token.trim()))
        .map_err(|_| AuthError::Malformed)
}

/// Validates bearer tokens against the process signing key
pub struct RequestGate {
    codec: Arc<TokenCodec>,
}

impl RequestGate {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Unauthenticated -> TokenPresent -> {Authorized, Rejected}
    pub fn evaluate(&self, headers: &HeaderMap) -> GateOutcome {
        let token = match extract_token(headers) {
            Ok(Some(token)) => token,
            Ok(None) => return GateOutcome::Unauthenticated,
            Err(err) => return GateOutcome::Rejected(err),
        };

        match self.authenticate_token(token) {
            Ok(context) => GateOutcome::Authorized(context),
            Err(err) => GateOutcome::Rejected(err),
        }
    }

    /// Decode a raw token into a request context
    pub fn authenticate_token(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = self.codec.decode(token)?;

        Ok(AuthContext {
            subject: claims.sub,
            roles: claims.roles,
            expires_at: claims.exp,
        })
    }
}

/// 请求网关中间件
///
/// Rejected requests never reach the handler; unauthenticated ones pass
/// through without an `AuthContext`.
pub async fn request_gate_middleware(
    State(gate): State<Arc<RequestGate>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match gate.evaluate(req.headers()) {
        GateOutcome::Unauthenticated => {
            tracing::trace!("No bearer token presented");
        }
        GateOutcome::Authorized(context) => {
            tracing::debug!(subject = %context.subject, "Request authorized");
            req.extensions_mut().insert(context);
        }
        GateOutcome::Rejected(err) => {
            tracing::debug!(reason = err.reason(), "Request rejected by gate");
            return Err(err.into());
        }
    }

    Ok(next.run(req).await)
}
