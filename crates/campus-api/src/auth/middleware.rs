//! Axum용 JWT 인증 추출기.
//!
//! - [`JwtAuth`]: Bearer 토큰 검증 (서명, 만료, 폐기 목록)
//! - [`OptionalJwtAuth`]: 토큰이 없거나 잘못되면 `None`
//! - [`CurrentSession`]: 토큰 주체의 프로필을 조회해 세션으로 확정

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use campus_core::{has_access_claim, Feature, Session};
use serde_json::json;
use std::sync::Arc;

use super::jwt::{decode_token, Claims, JwtError};
use crate::state::AppState;

/// JWT 인증 추출기.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn protected_handler(
///     JwtAuth(claims): JwtAuth,
/// ) -> impl IntoResponse {
///     format!("Authenticated user: {}", claims.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JwtAuth(pub Claims);

/// JWT 인증 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtAuthError {
    #[error("인증 토큰이 필요합니다")]
    MissingToken,
    #[error("잘못된 Authorization 헤더 형식")]
    InvalidAuthHeader,
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("유효하지 않은 토큰")]
    InvalidToken,
    #[error("로그아웃된 토큰입니다")]
    TokenRevoked,
    #[error("권한이 부족합니다")]
    InsufficientPermission,
}

impl JwtAuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            JwtAuthError::InsufficientPermission => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            JwtAuthError::MissingToken => "MISSING_TOKEN",
            JwtAuthError::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            JwtAuthError::TokenExpired => "TOKEN_EXPIRED",
            JwtAuthError::InvalidToken => "INVALID_TOKEN",
            JwtAuthError::TokenRevoked => "TOKEN_REVOKED",
            JwtAuthError::InsufficientPermission => "INSUFFICIENT_PERMISSION",
        }
    }
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string()
            }
        }));

        (self.status(), body).into_response()
    }
}

/// Authorization 헤더에서 Bearer 토큰 추출.
pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, JwtAuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(JwtAuthError::MissingToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(JwtAuthError::InvalidAuthHeader)
}

impl FromRequestParts<Arc<AppState>> for JwtAuth {
    type Rejection = JwtAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let token_data = decode_token(token, state.jwt_secret()).map_err(|e| match e {
            JwtError::TokenExpired => JwtAuthError::TokenExpired,
            _ => JwtAuthError::InvalidToken,
        })?;

        let claims = &token_data.claims;
        if state.is_revoked(&claims.jti).await || state.is_revoked(&claims.sid).await {
            return Err(JwtAuthError::TokenRevoked);
        }

        Ok(JwtAuth(token_data.claims))
    }
}

/// 선택적 JWT 인증 추출기.
///
/// 토큰이 있으면 검증하고, 없거나 유효하지 않으면 None을 반환합니다.
#[derive(Debug, Clone)]
pub struct OptionalJwtAuth(pub Option<Claims>);

impl FromRequestParts<Arc<AppState>> for OptionalJwtAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match JwtAuth::from_request_parts(parts, state).await {
            Ok(JwtAuth(claims)) => Ok(OptionalJwtAuth(Some(claims))),
            Err(_) => Ok(OptionalJwtAuth(None)),
        }
    }
}

/// 인증된 요청의 세션.
///
/// 프로필 조회가 실패하거나 레코드가 없으면 기본 역할(student) 세션입니다.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub claims: Claims,
    pub session: Session,
}

impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = JwtAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let JwtAuth(claims) = JwtAuth::from_request_parts(parts, state).await?;
        let session = state.resolve_session(&claims.identity()).await;
        Ok(CurrentSession { claims, session })
    }
}

/// 세션의 역할이 기능에 접근할 수 있는지 확인.
///
/// 로그아웃 세션이나 인식되지 않은 역할은 항상 거부됩니다.
pub fn require_feature(feature: Feature, session: &Session) -> Result<(), JwtAuthError> {
    if session.is_authenticated() && has_access_claim(&session.role, feature) {
        Ok(())
    } else {
        Err(JwtAuthError::InsufficientPermission)
    }
}
