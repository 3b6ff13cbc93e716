//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::{
    auth::middleware::request_gate_middleware,
    handlers,
    middleware::{request_tracking_middleware, AppState},
};

/// 登录请求体上限（字节）
const LOGIN_BODY_LIMIT: usize = 16 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（不经过请求网关）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/auth/login",
            post(handlers::auth::login).layer(RequestBodyLimitLayer::new(LOGIN_BODY_LIMIT)),
        );

    // 经过请求网关的路由：无令牌时以未认证身份继续，令牌无效时直接 401
    let gated_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_current_user))
        .layer(axum::middleware::from_fn_with_state(
            state.request_gate.clone(),
            request_gate_middleware,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(gated_routes)
        .layer(axum::middleware::from_fn(request_tracking_middleware))
        .with_state(state)
}
