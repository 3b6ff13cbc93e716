//! 卡片管理服务的认证核心
//! 密码哈希、JWT 令牌编解码、登录认证与请求网关

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
