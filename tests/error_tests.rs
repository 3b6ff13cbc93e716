//! 错误处理单元测试

use axum::{http::StatusCode, response::IntoResponse};
use card_auth::error::{AppError, AuthError};
use http_body_util::BodyExt;

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::Auth(AuthError::UnknownUser).status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::validation("bad").status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        AppError::Config("missing secret".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::internal_error("boom").status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_auth_error_reasons_are_distinct() {
    let reasons = [
        AuthError::UnknownUser.reason(),
        AuthError::BadCredentials.reason(),
        AuthError::InvalidSignature.reason(),
        AuthError::Expired.reason(),
        AuthError::Malformed.reason(),
    ];

    let unique: std::collections::HashSet<_> = reasons.iter().collect();
    assert_eq!(unique.len(), reasons.len());
}

#[tokio::test]
async fn test_response_body_does_not_leak_reason() {
    for err in [AuthError::UnknownUser, AuthError::BadCredentials, AuthError::Expired] {
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("Authentication failed"));
        assert!(!body.contains(err.reason()));
    }
}

#[tokio::test]
async fn test_internal_error_response_is_generic() {
    let response = AppError::internal_error("signing key unavailable").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"]["code"], 500);
    assert_eq!(json["error"]["message"], "Internal server error");
    assert!(json["error"]["request_id"].is_string());
}
