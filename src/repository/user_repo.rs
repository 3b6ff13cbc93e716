//! User store (用户查询接口)

use crate::{config::SeedUser, error::AppError, models::user::Identity};
use argon2::password_hash::PasswordHash;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::collections::HashMap;

/// Identity lookup consumed by the authenticator.
///
/// Implementations may be slow (network, disk); callers must not hold locks
/// across the await.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Ok(None)` when no identity is registered under `username`
    async fn find_identity(&self, username: &str) -> Result<Option<Identity>, AppError>;
}

/// Read-only in-process user store.
///
/// Built once at startup and never mutated afterwards, so lookups need no
/// locking.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    users: HashMap<String, Identity>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 构建时添加用户
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.insert(identity);
        self
    }

    /// Insert or replace, returning the previous entry
    pub fn insert(&mut self, identity: Identity) -> Option<Identity> {
        self.users.insert(identity.username.clone(), identity)
    }

    /// 从配置中的预置用户构建
    pub fn from_seed(users: &[SeedUser]) -> Result<Self, AppError> {
        let mut store = Self::new();

        for user in users {
            // Reject digests that could never verify instead of failing every login
            PasswordHash::new(user.password_hash.expose_secret()).map_err(|e| {
                AppError::Config(format!(
                    "Seed user '{}' has an invalid password hash: {}",
                    user.username, e
                ))
            })?;

            let subject = user.subject.clone().unwrap_or_else(|| user.username.clone());
            store.insert(Identity::new(
                user.username.clone(),
                subject,
                user.password_hash.expose_secret().clone(),
                user.roles.clone(),
            ));
        }

        tracing::info!(users = store.len(), "User store loaded");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_identity(&self, username: &str) -> Result<Option<Identity>, AppError> {
        Ok(self.users.get(username).cloned())
    }
}
