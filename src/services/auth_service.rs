//! 认证服务：凭证校验与令牌签发

use crate::{
    auth::{jwt::IssuedToken, password::PasswordHasher, TokenCodec},
    error::{AppError, AuthError},
    repository::UserStore,
};
use secrecy::ExposeSecret;
use std::sync::Arc;

pub struct AuthService {
    user_store: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    codec: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        hasher: Arc<PasswordHasher>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            user_store,
            hasher,
            codec,
        }
    }

    /// 用户登录
    ///
    /// Stateless: on success the only effect is the returned token.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AppError> {
        // 查询用户（不持有任何锁）
        let identity = match self.user_store.find_identity(username).await? {
            Some(identity) => identity,
            None => {
                // 与密码校验耗时保持一致，避免用户名枚举
                let hasher = self.hasher.clone();
                let password = password.to_owned();
                run_blocking(move || hasher.dummy_verify(&password)).await?;

                return Err(self.reject(username, AuthError::UnknownUser));
            }
        };

        // 验证密码（Argon2 为 CPU 密集操作，放到阻塞线程池）
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let password_hash = identity.password_hash.clone();
        let verified =
            run_blocking(move || hasher.verify(&password, password_hash.expose_secret())).await?;

        if !verified {
            return Err(self.reject(username, AuthError::BadCredentials));
        }

        // 生成令牌
        let token = self
            .codec
            .issue_access_token(&identity.subject, &identity.roles)?;

        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);
        tracing::info!(
            username = %identity.username,
            subject = %identity.subject,
            roles = ?identity.roles,
            "Login succeeded"
        );

        Ok(token)
    }

    fn reject(&self, username: &str, err: AuthError) -> AppError {
        metrics::counter!("auth_login_total", "outcome" => err.reason()).increment(1);
        tracing::warn!(%username, reason = err.reason(), "Login failed");
        err.into()
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!("Blocking task failed: {:?}", e);
        AppError::Internal(format!("Blocking task failed: {}", e))
    })
}
