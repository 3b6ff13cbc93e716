//! 测试公共模块
//! 提供测试配置、预置用户与应用状态

#![allow(dead_code)]

use axum::{body::Body, http::Response};
use card_auth::{
    auth::{Clock, PasswordHasher},
    config::{AppConfig, LogFormat, LoggingConfig, SecurityConfig, SeedUser, ServerConfig},
    middleware::AppState,
};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use secrecy::Secret;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub const JWT_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

/// 测试用安全配置（Argon2 取最小开销）
pub fn create_security_config() -> SecurityConfig {
    SecurityConfig {
        jwt_secret: Secret::new(JWT_SECRET.to_string()),
        access_token_exp_secs: 300,
        hash_memory_kib: 64,
        hash_iterations: 1,
        hash_parallelism: 1,
    }
}

pub fn seed_user(username: &str, password: &str, roles: &[&str]) -> SeedUser {
    let hasher = PasswordHasher::from_config(&create_security_config()).unwrap();
    SeedUser {
        username: username.to_string(),
        subject: None,
        password_hash: Secret::new(hasher.hash(password).unwrap()),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

/// 创建测试配置：alice (USER) 与 admin (ADMIN, USER)
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            graceful_shutdown_timeout_secs: 5,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
        },
        security: create_security_config(),
        users: vec![
            seed_user("alice", "correct-pass", &["USER"]),
            seed_user("admin", "admin-pass-123", &["ADMIN", "USER"]),
        ],
    }
}

pub fn create_test_app_state() -> Arc<AppState> {
    Arc::new(AppState::from_config(&create_test_config()).expect("Failed to build app state"))
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// 可手动推进的时钟
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(ts: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(ts)))
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.0.load(Ordering::SeqCst), 0).unwrap()
    }
}
