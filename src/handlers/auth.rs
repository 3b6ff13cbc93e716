//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::{auth::*, user::CurrentUserResponse},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

/// 登录
///
/// Every authentication failure yields the same 401 body. A body that does
/// not deserialize is a 400 like any other validation failure.
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let response: LoginResponse = state
        .auth_service
        .login(&req.username, &req.password)
        .await?;

    Ok(Json(response))
}

/// 获取当前用户信息
pub async fn get_current_user(auth_context: AuthContext) -> Result<impl IntoResponse, AppError> {
    Ok(Json(CurrentUserResponse {
        subject: auth_context.subject,
        roles: auth_context.roles,
        expires_at: auth_context.expires_at,
    }))
}
