//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::http::{Method, StatusCode, Uri};
use axum::Json;
use campus_session::{AuthError, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::auth::{JwtAuthError, JwtError};

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "PROFILE_NOT_FOUND",
///   "message": "프로필을 찾을 수 없습니다: u-123",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_CREDENTIALS", "VALIDATION_ERROR", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// HTTP 메서드 (GET, POST 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 요청 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    ///
    /// # Example
    ///
    /// ```
    /// use campus_api::error::ApiErrorResponse;
    ///
    /// let error = ApiErrorResponse::new("NOT_FOUND", "Profile not found");
    /// assert_eq!(error.code(), "NOT_FOUND");
    /// ```
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 타임스탬프 없는 에러 생성.
    pub fn simple(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: None,
            method: None,
            path: None,
        }
    }

    /// 요청 정보 추가.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// 핸들러 반환 타입.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 상태 코드와 함께 에러 응답 생성.
pub fn api_error(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiErrorResponse>) {
    (status, Json(ApiErrorResponse::new(code, message)))
}

/// 인증 협력자 에러 변환.
pub fn from_auth_error(err: &AuthError) -> (StatusCode, Json<ApiErrorResponse>) {
    let status = match err {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::EmailInUse => StatusCode::CONFLICT,
        AuthError::WeakPassword(_) | AuthError::InvalidEmail => StatusCode::BAD_REQUEST,
        AuthError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err.code(), err.to_string())
}

/// 프로필 저장소 에러 변환.
pub fn from_store_error(err: &StoreError) -> (StatusCode, Json<ApiErrorResponse>) {
    let (status, code) = match err {
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "PROFILE_NOT_FOUND"),
        StoreError::AlreadyExists(_) => (StatusCode::CONFLICT, "PROFILE_EXISTS"),
        StoreError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
        StoreError::Backend(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
    };
    api_error(status, code, err.to_string())
}

/// 토큰 발급 에러 변환.
pub fn from_jwt_error(err: &JwtError) -> (StatusCode, Json<ApiErrorResponse>) {
    match err {
        JwtError::EncodingError(_) => {
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "TOKEN_ERROR", err.to_string())
        }
        JwtError::TokenExpired => {
            api_error(StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED", err.to_string())
        }
        JwtError::DecodingError | JwtError::InvalidToken => {
            api_error(StatusCode::UNAUTHORIZED, "INVALID_TOKEN", err.to_string())
        }
    }
}

/// 추출기 에러를 핸들러 에러 형식으로 변환.
pub fn from_jwt_auth_error(err: &JwtAuthError) -> (StatusCode, Json<ApiErrorResponse>) {
    api_error(err.status(), err.code(), err.to_string())
}
