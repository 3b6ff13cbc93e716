//! HTTP 中间件与应用状态
//! 请求追踪（trace_id / request_id、指标、日志）

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    auth::{PasswordHasher, RequestGate, TokenCodec},
    config::AppConfig,
    error::AppError,
    repository::{InMemoryUserStore, UserStore},
    services::AuthService,
};

/// 外部传入的 trace_id 最大长度
const MAX_TRACE_ID_LEN: usize = 128;

/// 应用状态
///
/// 启动后不可变，请求之间只共享只读数据（签名密钥位于 TokenCodec 内部）
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub request_gate: Arc<RequestGate>,
}

impl AppState {
    /// 按配置组装各组件，用户来自配置中的预置用户
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let user_store = Arc::new(InMemoryUserStore::from_seed(&config.users)?);
        Self::with_user_store(config, user_store)
    }

    /// 使用外部提供的用户查询实现组装
    pub fn with_user_store(config: &AppConfig, user_store: Arc<dyn UserStore>) -> Result<Self, AppError> {
        let token_codec = Arc::new(TokenCodec::from_config(&config.security)?);
        let hasher = Arc::new(PasswordHasher::from_config(&config.security)?);

        let request_gate = Arc::new(RequestGate::new(token_codec.clone()));
        let auth_service = Arc::new(AuthService::new(user_store, hasher, token_codec));

        Ok(Self {
            auth_service,
            request_gate,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        metrics::counter!(
            "http_requests_total",
            "method" => method_label(&method),
            "status" => status_label(status)
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            path = %path,
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        // 在响应头中添加 trace_id / request_id
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= MAX_TRACE_ID_LEN)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

// 指标标签只使用静态字符串
fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        _ => "UNKNOWN",
    }
}

fn status_label(status: u16) -> &'static str {
    match status {
        200 => "200",
        400 => "400",
        401 => "401",
        403 => "403",
        404 => "404",
        413 => "413",
        415 => "415",
        422 => "422",
        500 => "500",
        _ => "other",
    }
}
